//! Uncollected fee resolution from concentrated liquidity fee-growth counters.
//!
//! Fee-growth counters are 256-bit unsigned values scaled by 2^128 that are
//! allowed to wrap. Every subtraction between counters is therefore modular;
//! the difference of two snapshots is meaningful even after the global
//! counter overflowed between them.

use crate::error::FeeGrowthError;
use crate::pool::PoolFeeState;
use crate::position::LiquidityRange;
use crate::token::TokenAmount;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Bit width of the fee-growth fixed-point fraction.
pub const Q128_SHIFT: usize = 128;

/// Fee growth split around a range for one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeGrowthDecomposition {
    /// Growth accumulated below the lower tick.
    pub below: U256,
    /// Growth accumulated above the upper tick.
    pub above: U256,
    /// Growth accumulated inside the range: `global - below - above`.
    pub inside: U256,
}

/// Uncollected amounts for one range, in raw token units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UncollectedFees {
    pub amount0: TokenAmount,
    pub amount1: TokenAmount,
}

impl UncollectedFees {
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Modular subtraction on 256-bit counters.
#[inline]
pub fn wrapping_sub(a: U256, b: U256) -> U256 {
    a.overflowing_sub(b).0
}

/// Splits the global fee growth of one token into below/above/inside parts.
pub fn decompose(
    fee_growth_global: U256,
    fee_growth_outside_lower: U256,
    fee_growth_outside_upper: U256,
    tick_current: i32,
    tick_lower: i32,
    tick_upper: i32,
) -> FeeGrowthDecomposition {
    let below = if tick_current >= tick_lower {
        fee_growth_outside_lower
    } else {
        wrapping_sub(fee_growth_global, fee_growth_outside_lower)
    };

    let above = if tick_current >= tick_upper {
        wrapping_sub(fee_growth_global, fee_growth_outside_upper)
    } else {
        fee_growth_outside_upper
    };

    let inside = wrapping_sub(wrapping_sub(fee_growth_global, below), above);

    FeeGrowthDecomposition {
        below,
        above,
        inside,
    }
}

/// Fees owed on `liquidity` for the growth between two inside snapshots.
///
/// `liquidity * (inside_now - inside_last) / 2^128`, with the product taken in
/// 512 bits.
pub fn fees_owed(
    liquidity: u128,
    fee_growth_inside_now: U256,
    fee_growth_inside_last: U256,
) -> Result<U256, FeeGrowthError> {
    let delta = wrapping_sub(fee_growth_inside_now, fee_growth_inside_last);
    let product = U256::from(liquidity).full_mul(delta);
    U256::try_from(product >> Q128_SHIFT).map_err(|_| FeeGrowthError::Overflow)
}

/// Current fee growth inside `range` for both tokens.
pub fn fee_growth_inside(
    pool: &PoolFeeState,
    range: &LiquidityRange,
) -> Result<(U256, U256), FeeGrowthError> {
    let lower = pool
        .tick(range.tick_lower)
        .ok_or(FeeGrowthError::MissingTickState {
            tick: range.tick_lower,
        })?;
    let upper = pool
        .tick(range.tick_upper)
        .ok_or(FeeGrowthError::MissingTickState {
            tick: range.tick_upper,
        })?;

    let token0 = decompose(
        pool.fee_growth_global0_x128,
        lower.fee_growth_outside0_x128,
        upper.fee_growth_outside0_x128,
        pool.tick_current,
        range.tick_lower,
        range.tick_upper,
    );
    let token1 = decompose(
        pool.fee_growth_global1_x128,
        lower.fee_growth_outside1_x128,
        upper.fee_growth_outside1_x128,
        pool.tick_current,
        range.tick_lower,
        range.tick_upper,
    );

    Ok((token0.inside, token1.inside))
}

/// Uncollected fees accrued to `range` since its last harvest.
///
/// A range without liquidity owes nothing and does not need tick state.
pub fn uncollected_fees(
    pool: &PoolFeeState,
    range: &LiquidityRange,
) -> Result<UncollectedFees, FeeGrowthError> {
    if range.liquidity == 0 {
        return Ok(UncollectedFees::zero());
    }

    let (inside0, inside1) = fee_growth_inside(pool, range)?;

    let amount0 = fees_owed(range.liquidity, inside0, range.fee_growth_inside0_last_x128)?;
    let amount1 = fees_owed(range.liquidity, inside1, range.fee_growth_inside1_last_x128)?;

    Ok(UncollectedFees {
        amount0: TokenAmount(amount0),
        amount1: TokenAmount(amount1),
    })
}
