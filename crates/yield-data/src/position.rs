use crate::parse::{RawNumber, parse_decimal, parse_i32, parse_i64, parse_u8, parse_u128, parse_u256};
use crate::rebalance::{RebalanceRecord, fee_events_lenient};
use anyhow::{Context, Result, anyhow};
use lp_yield_analytics::PositionInput;
use lp_yield_domain::{
    ConversionContext, LiquidityRange, PoolFeeState, RangeKind, TickFeeState,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub decimals: RawNumber,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolRef {
    pub id: String,
    pub token0: TokenRecord,
    pub token1: TokenRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRecord {
    pub base_token_index: RawNumber,
    pub price_token_in_base: RawNumber,
    #[serde(rename = "priceBaseInUSD")]
    pub price_base_in_usd: RawNumber,
}

impl ConversionRecord {
    pub fn to_context(&self) -> Result<ConversionContext> {
        Ok(ConversionContext::new(
            parse_i64(&self.base_token_index, "conversion.baseTokenIndex")?,
            parse_decimal(&self.price_token_in_base, "conversion.priceTokenInBase")?,
            parse_decimal(&self.price_base_in_usd, "conversion.priceBaseInUSD")?,
        ))
    }
}

/// A managed position with its base range and optional limit range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionFeeRecord {
    pub id: String,
    pub pool: PoolRef,
    pub base_liquidity: RawNumber,
    pub base_lower: RawNumber,
    pub base_upper: RawNumber,
    pub base_fee_growth_inside0_last_x128: RawNumber,
    pub base_fee_growth_inside1_last_x128: RawNumber,
    #[serde(default)]
    pub limit_liquidity: Option<RawNumber>,
    #[serde(default)]
    pub limit_lower: Option<RawNumber>,
    #[serde(default)]
    pub limit_upper: Option<RawNumber>,
    #[serde(default)]
    pub limit_fee_growth_inside0_last_x128: Option<RawNumber>,
    #[serde(default)]
    pub limit_fee_growth_inside1_last_x128: Option<RawNumber>,
    pub conversion: ConversionRecord,
    #[serde(rename = "tvlUSD")]
    pub tvl_usd: RawNumber,
}

fn required<'a>(raw: &'a Option<RawNumber>, field: &str) -> Result<&'a RawNumber> {
    raw.as_ref().ok_or_else(|| anyhow!("{field}: missing"))
}

impl PositionFeeRecord {
    fn base_range(&self) -> Result<LiquidityRange> {
        Ok(LiquidityRange::new(
            parse_i32(&self.base_lower, "baseLower")?,
            parse_i32(&self.base_upper, "baseUpper")?,
            parse_u128(&self.base_liquidity, "baseLiquidity")?,
        )
        .with_fee_growth_inside_last(
            parse_u256(&self.base_fee_growth_inside0_last_x128, "baseFeeGrowthInside0LastX128")?,
            parse_u256(&self.base_fee_growth_inside1_last_x128, "baseFeeGrowthInside1LastX128")?,
        ))
    }

    /// `None` when the record carries no limit liquidity.
    fn limit_range(&self) -> Result<Option<LiquidityRange>> {
        let Some(liquidity) = &self.limit_liquidity else {
            return Ok(None);
        };
        let range = LiquidityRange::new(
            parse_i32(required(&self.limit_lower, "limitLower")?, "limitLower")?,
            parse_i32(required(&self.limit_upper, "limitUpper")?, "limitUpper")?,
            parse_u128(liquidity, "limitLiquidity")?,
        )
        .with_fee_growth_inside_last(
            parse_u256(
                required(&self.limit_fee_growth_inside0_last_x128, "limitFeeGrowthInside0LastX128")?,
                "limitFeeGrowthInside0LastX128",
            )?,
            parse_u256(
                required(&self.limit_fee_growth_inside1_last_x128, "limitFeeGrowthInside1LastX128")?,
                "limitFeeGrowthInside1LastX128",
            )?,
        );
        Ok(Some(range))
    }

    pub fn ranges(&self) -> Result<Vec<(RangeKind, LiquidityRange)>> {
        let mut ranges = vec![(RangeKind::Base, self.base_range()?)];
        if let Some(limit) = self.limit_range()? {
            ranges.push((RangeKind::Limit, limit));
        }
        Ok(ranges)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStateRecord {
    pub tick: RawNumber,
    pub fee_growth_global0_x128: RawNumber,
    pub fee_growth_global1_x128: RawNumber,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickRecord {
    #[serde(default)]
    pub tick_idx: Option<RawNumber>,
    pub fee_growth_outside0_x128: RawNumber,
    pub fee_growth_outside1_x128: RawNumber,
}

/// Pool state plus the tick rows at each range boundary.
///
/// Each boundary list holds at most one row; an empty list means the pool has
/// never recorded the tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolTickRecord {
    pub pool: PoolStateRecord,
    #[serde(default)]
    pub base_lower: Vec<TickRecord>,
    #[serde(default)]
    pub base_upper: Vec<TickRecord>,
    #[serde(default)]
    pub limit_lower: Vec<TickRecord>,
    #[serde(default)]
    pub limit_upper: Vec<TickRecord>,
}

impl PoolTickRecord {
    /// Builds the pool fee state for `ranges`, keyed by the range boundaries.
    pub fn to_pool_state(&self, ranges: &[(RangeKind, LiquidityRange)]) -> Result<PoolFeeState> {
        let mut pool = PoolFeeState::new(
            parse_i32(&self.pool.tick, "pool.tick")?,
            parse_u256(&self.pool.fee_growth_global0_x128, "pool.feeGrowthGlobal0X128")?,
            parse_u256(&self.pool.fee_growth_global1_x128, "pool.feeGrowthGlobal1X128")?,
        );

        for (kind, range) in ranges {
            let (lower, upper, lower_field, upper_field) = match kind {
                RangeKind::Base => (&self.base_lower, &self.base_upper, "baseLower", "baseUpper"),
                RangeKind::Limit => (&self.limit_lower, &self.limit_upper, "limitLower", "limitUpper"),
            };
            for (rows, tick, field) in [
                (lower, range.tick_lower, lower_field),
                (upper, range.tick_upper, upper_field),
            ] {
                match rows.first() {
                    Some(row) => {
                        pool.ticks.insert(tick, row.to_state(field)?);
                    }
                    None => debug!(tick, range = %kind, "No tick row recorded"),
                }
            }
        }
        Ok(pool)
    }
}

impl TickRecord {
    fn to_state(&self, field: &str) -> Result<TickFeeState> {
        Ok(TickFeeState::new(
            parse_u256(&self.fee_growth_outside0_x128, &format!("{field}.feeGrowthOutside0X128"))?,
            parse_u256(&self.fee_growth_outside1_x128, &format!("{field}.feeGrowthOutside1X128"))?,
        ))
    }
}

/// Assembles the engine input for one position.
///
/// Malformed rebalances are dropped; malformed position or pool fields fail the
/// whole position.
pub fn build_position_input(
    position: &PositionFeeRecord,
    ticks: &PoolTickRecord,
    rebalances: &[RebalanceRecord],
) -> Result<PositionInput> {
    let build = || -> Result<PositionInput> {
        let ranges = position.ranges()?;
        let pool = ticks.to_pool_state(&ranges)?;
        Ok(PositionInput {
            id: position.id.clone(),
            pool,
            ranges,
            decimals0: parse_u8(&position.pool.token0.decimals, "pool.token0.decimals")?,
            decimals1: parse_u8(&position.pool.token1.decimals, "pool.token1.decimals")?,
            conversion: position.conversion.to_context()?,
            tvl_usd: parse_decimal(&position.tvl_usd, "tvlUSD")?,
            events: fee_events_lenient(rebalances),
        })
    };
    build().with_context(|| format!("position {}", position.id))
}
