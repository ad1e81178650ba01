use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a liquidity range within a managed position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RangeKind {
    /// The main range around the current price.
    Base,
    /// The single-sided range holding leftover inventory.
    Limit,
}

impl fmt::Display for RangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => write!(f, "base"),
            Self::Limit => write!(f, "limit"),
        }
    }
}

/// A liquidity range as snapshotted at its last harvest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityRange {
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub fee_growth_inside0_last_x128: U256,
    pub fee_growth_inside1_last_x128: U256,
}

impl LiquidityRange {
    #[must_use]
    pub fn new(tick_lower: i32, tick_upper: i32, liquidity: u128) -> Self {
        Self {
            tick_lower,
            tick_upper,
            liquidity,
            fee_growth_inside0_last_x128: U256::zero(),
            fee_growth_inside1_last_x128: U256::zero(),
        }
    }

    /// Sets the fee growth inside the range at the last harvest.
    #[must_use]
    pub fn with_fee_growth_inside_last(mut self, token0: U256, token1: U256) -> Self {
        self.fee_growth_inside0_last_x128 = token0;
        self.fee_growth_inside1_last_x128 = token1;
        self
    }
}
