use crate::error::ValuationError;
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest scale a `Decimal` can carry.
const MAX_DECIMAL_SCALE: u8 = 28;
/// Width of the `Decimal` mantissa.
const DECIMAL_MANTISSA_BITS: usize = 96;

/// A raw token amount in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TokenAmount(pub U256);

impl TokenAmount {
    pub fn new(amount: impl Into<U256>) -> Self {
        Self(amount.into())
    }

    /// Converts the raw amount into whole token units.
    ///
    /// The integer and fractional parts are split in 256-bit space first so
    /// that no precision is lost for amounts that fit a `Decimal`.
    pub fn to_decimal(&self, decimals: u8) -> Result<Decimal, ValuationError> {
        if decimals > MAX_DECIMAL_SCALE {
            return Err(ValuationError::UnsupportedDecimals(decimals));
        }

        let divisor = U256::exp10(decimals as usize);
        let (whole, frac) = self.0.div_mod(divisor);

        let overflow = || ValuationError::AmountOverflow {
            amount: self.0.to_string(),
        };

        if whole.bits() > DECIMAL_MANTISSA_BITS {
            return Err(overflow());
        }
        let whole = Decimal::try_from_i128_with_scale(whole.low_u128() as i128, 0)
            .map_err(|_| overflow())?;

        // frac < 10^28, always fits the mantissa
        let frac = Decimal::try_from_i128_with_scale(frac.low_u128() as i128, decimals as u32)
            .map_err(|_| overflow())?;

        whole.checked_add(frac).ok_or_else(overflow)
    }
}

impl From<u64> for TokenAmount {
    fn from(v: u64) -> Self {
        Self(U256::from(v))
    }
}

impl From<u128> for TokenAmount {
    fn from(v: u128) -> Self {
        Self(U256::from(v))
    }
}

impl From<U256> for TokenAmount {
    fn from(v: U256) -> Self {
        Self(v)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
