use anyhow::{Context, Result, anyhow, bail};
use primitive_types::U256;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A numeric field as the ledger emits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for RawNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<&str> for RawNumber {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for RawNumber {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

/// Parses a decimal amount, accepting plain and scientific notation.
pub fn parse_decimal(raw: &RawNumber, field: &str) -> Result<Decimal> {
    match raw {
        RawNumber::Text(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .with_context(|| format!("{field}: invalid decimal {s:?}"))
        }
        RawNumber::Integer(i) => Ok(Decimal::from(*i)),
        RawNumber::Float(x) => {
            Decimal::from_f64(*x).ok_or_else(|| anyhow!("{field}: unrepresentable number {x}"))
        }
    }
}

/// Parses a non-negative 256-bit integer.
pub fn parse_u256(raw: &RawNumber, field: &str) -> Result<U256> {
    match raw {
        RawNumber::Text(s) => U256::from_dec_str(s.trim())
            .map_err(|e| anyhow!("{field}: invalid 256-bit integer {s:?}: {e:?}")),
        RawNumber::Integer(i) if *i >= 0 => Ok(U256::from(*i as u64)),
        other => bail!("{field}: expected a non-negative integer string, got {other}"),
    }
}

/// Parses a non-negative 128-bit integer.
pub fn parse_u128(raw: &RawNumber, field: &str) -> Result<u128> {
    match raw {
        RawNumber::Text(s) => s
            .trim()
            .parse::<u128>()
            .with_context(|| format!("{field}: invalid 128-bit integer {s:?}")),
        RawNumber::Integer(i) if *i >= 0 => Ok(*i as u128),
        other => bail!("{field}: expected a non-negative integer, got {other}"),
    }
}

/// Parses a signed integer that fits `i64`.
pub fn parse_i64(raw: &RawNumber, field: &str) -> Result<i64> {
    match raw {
        RawNumber::Text(s) => s
            .trim()
            .parse::<i64>()
            .with_context(|| format!("{field}: invalid integer {s:?}")),
        RawNumber::Integer(i) => Ok(*i),
        RawNumber::Float(x) if x.fract() == 0.0 && x.is_finite() => Ok(*x as i64),
        RawNumber::Float(x) => bail!("{field}: expected an integer, got {x}"),
    }
}

pub fn parse_i32(raw: &RawNumber, field: &str) -> Result<i32> {
    let value = parse_i64(raw, field)?;
    i32::try_from(value).with_context(|| format!("{field}: {value} out of range for a tick"))
}

pub fn parse_u8(raw: &RawNumber, field: &str) -> Result<u8> {
    let value = parse_i64(raw, field)?;
    u8::try_from(value).with_context(|| format!("{field}: {value} out of range"))
}
