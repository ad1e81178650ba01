use thiserror::Error;

/// Errors raised while resolving uncollected fees from fee-growth counters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeGrowthError {
    /// The pool never recorded activity at a boundary tick of the range.
    #[error("no fee-growth state recorded for tick {tick}")]
    MissingTickState {
        /// The boundary tick without a state row.
        tick: i32,
    },
    /// The scaled product did not fit back into 256 bits.
    #[error("uncollected fee amount overflows 256 bits")]
    Overflow,
}

/// Errors raised while converting raw token amounts into USD.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValuationError {
    /// Token decimals beyond what a decimal value can carry.
    #[error("unsupported token decimals: {0}")]
    UnsupportedDecimals(u8),
    /// The raw amount is too large to be represented as a decimal.
    #[error("token amount {amount} cannot be represented as a decimal")]
    AmountOverflow {
        /// Raw amount, in base units.
        amount: String,
    },
    /// A multiplication overflowed the decimal range.
    #[error("decimal overflow while valuing token {token}")]
    ArithmeticOverflow {
        /// Index of the token being valued.
        token: u8,
    },
    /// Adding valued fees together overflowed the decimal range.
    #[error("decimal overflow while summing fee values")]
    SumOverflow,
}

impl ValuationError {
    /// Whether the failure comes from the size of the amounts rather than
    /// from the token metadata.
    pub fn is_overflow(&self) -> bool {
        matches!(
            self,
            Self::AmountOverflow { .. } | Self::ArithmeticOverflow { .. } | Self::SumOverflow
        )
    }
}
