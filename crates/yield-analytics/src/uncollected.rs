//! Uncollected fees of a managed position and its synthetic "now" event.

use crate::error::AnalyticsError;
use lp_yield_domain::math::fee_growth::{UncollectedFees, uncollected_fees};
use lp_yield_domain::metrics::{FeeValuation, UncollectedFeesUsd, value_fees};
use lp_yield_domain::{
    ConversionContext, FeeEvent, FeeGrowthError, LiquidityRange, PoolFeeState, RangeKind,
    ValuationError,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Identifier of the synthetic event built from uncollected fees.
pub const UNCOLLECTED_EVENT_ID: &str = "uncollected_fees";

/// Uncollected fees of one range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeFees {
    pub kind: RangeKind,
    /// Raw amounts in base units.
    pub raw: UncollectedFees,
    pub valuation: FeeValuation,
    /// The range's tick state was missing and its contribution zeroed.
    pub missing_tick_state: bool,
    /// The owed amount could not be valued as a decimal; its contribution
    /// was zeroed. `raw` still holds the resolved amounts.
    pub valuation_overflow: bool,
}

/// Uncollected fees across all ranges of a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUncollectedFees {
    pub ranges: Vec<RangeFees>,
    pub total: UncollectedFeesUsd,
}

impl PositionUncollectedFees {
    pub fn range(&self, kind: RangeKind) -> Option<&RangeFees> {
        self.ranges.iter().find(|r| r.kind == kind)
    }
}

/// Resolves and values uncollected fees for every range of a position.
///
/// A range whose boundary tick has no state row contributes zero, as does a
/// range whose owed amount is too large to value (a stale checkpoint ahead of
/// the pool's inside growth wraps to an enormous delta). An invalid conversion
/// context values every range at zero USD.
pub fn uncollected_position_fees(
    pool: &PoolFeeState,
    ranges: &[(RangeKind, LiquidityRange)],
    decimals0: u8,
    decimals1: u8,
    conversion: &ConversionContext,
    tvl_usd: Decimal,
) -> Result<PositionUncollectedFees, AnalyticsError> {
    if !conversion.is_valid() {
        warn!(base_token = ?conversion.base_token, "invalid conversion context, fees valued at zero");
    }

    let mut out = Vec::with_capacity(ranges.len());
    let mut total = FeeValuation::default();

    for (kind, range) in ranges {
        let (raw, missing_tick_state) = match uncollected_fees(pool, range) {
            Ok(fees) => (fees, false),
            Err(FeeGrowthError::MissingTickState { tick }) => {
                warn!(range = %kind, tick, "missing tick state, range contributes no fees");
                (UncollectedFees::zero(), true)
            }
            Err(e) => return Err(e.into()),
        };

        let valued = value_fees(&raw, decimals0, decimals1, conversion).and_then(|valuation| {
            // the running total must stay summable for the synthetic event
            let next = total.checked_add(&valuation)?;
            next.total_usd()?;
            Ok((valuation, next))
        });

        let (valuation, valuation_overflow) = match valued {
            Ok((valuation, next)) => {
                total = next;
                (valuation, false)
            }
            Err(e) if e.is_overflow() => {
                warn!(
                    range = %kind,
                    amount0 = %raw.amount0,
                    amount1 = %raw.amount1,
                    error = %e,
                    "uncollected fees out of range, range contributes no fees"
                );
                (FeeValuation::default(), true)
            }
            Err(e) => return Err(e.into()),
        };

        out.push(RangeFees {
            kind: *kind,
            raw,
            valuation,
            missing_tick_state,
            valuation_overflow,
        });
    }

    Ok(PositionUncollectedFees {
        ranges: out,
        total: total.with_tvl(tvl_usd),
    })
}

/// Builds the synthetic fee event representing uncollected fees at `now`.
pub fn uncollected_fee_event(
    fees: &UncollectedFeesUsd,
    now: i64,
    protocol_fee_share: Decimal,
) -> Result<FeeEvent, ValuationError> {
    let gross = fees.total_usd()?.max(Decimal::ZERO);
    let protocol = gross
        .checked_mul(protocol_fee_share)
        .ok_or(ValuationError::SumOverflow)?;
    let net = gross
        .checked_sub(protocol)
        .ok_or(ValuationError::SumOverflow)?;

    Ok(FeeEvent::new(UNCOLLECTED_EVENT_ID, now, gross, fees.tvl_usd).with_fee_split(protocol, net))
}
