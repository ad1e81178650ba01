use crate::error::ValuationError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which token of the pair prices are quoted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseToken {
    Token0,
    Token1,
    /// The ledger reported an index outside {0, 1}.
    Invalid(i64),
}

impl From<i64> for BaseToken {
    fn from(index: i64) -> Self {
        match index {
            0 => Self::Token0,
            1 => Self::Token1,
            other => Self::Invalid(other),
        }
    }
}

/// Rule for converting pool token amounts into USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionContext {
    pub base_token: BaseToken,
    /// Price of the non-base token denominated in the base token.
    pub price_token_in_base: Decimal,
    /// Price of the base token in USD.
    pub price_base_in_usd: Decimal,
}

impl ConversionContext {
    pub fn new(
        base_token_index: i64,
        price_token_in_base: Decimal,
        price_base_in_usd: Decimal,
    ) -> Self {
        Self {
            base_token: BaseToken::from(base_token_index),
            price_token_in_base,
            price_base_in_usd,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self.base_token, BaseToken::Invalid(_))
    }

    /// USD value of one whole unit of token `index`, `None` when the context is invalid.
    ///
    /// The base token converts directly; the other token goes through the base
    /// token price first.
    pub fn usd_per_token(&self, index: u8) -> Result<Option<Decimal>, ValuationError> {
        let is_base = match (self.base_token, index) {
            (BaseToken::Token0, 0) | (BaseToken::Token1, 1) => true,
            (BaseToken::Token0, _) | (BaseToken::Token1, _) => false,
            (BaseToken::Invalid(_), _) => return Ok(None),
        };

        if is_base {
            return Ok(Some(self.price_base_in_usd));
        }
        self.price_token_in_base
            .checked_mul(self.price_base_in_usd)
            .map(Some)
            .ok_or(ValuationError::ArithmeticOverflow { token: index })
    }
}
