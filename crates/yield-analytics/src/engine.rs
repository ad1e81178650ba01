//! Per-position and batch evaluation.
//!
//! A position runs through: uncollected fees → synthetic "now" event →
//! event overrides → returns → optional zero cascade → return overrides.
//! Positions are independent; a failure in one never affects the others.

use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, ConfigError};
use crate::overrides::OverridePolicy;
use crate::returns::{ReturnsCalculator, cascade_zero_returns};
use crate::uncollected::{
    PositionUncollectedFees, uncollected_fee_event, uncollected_position_fees,
};
use lp_yield_domain::{
    ConversionContext, FeeEvent, LiquidityRange, PeriodReturns, PoolFeeState, RangeKind,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Everything the data collaborator supplies for one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionInput {
    pub id: String,
    pub pool: PoolFeeState,
    pub ranges: Vec<(RangeKind, LiquidityRange)>,
    pub decimals0: u8,
    pub decimals1: u8,
    pub conversion: ConversionContext,
    pub tvl_usd: Decimal,
    /// Historical fee events, in any order.
    pub events: Vec<FeeEvent>,
}

/// Result of evaluating one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    pub id: String,
    /// Evaluation time, unix seconds; the synthetic event is stamped with it.
    pub as_of: i64,
    pub uncollected: PositionUncollectedFees,
    pub returns: PeriodReturns,
    /// Events handed to the returns calculator, synthetic one included.
    pub events_used: usize,
    pub event_corrections: usize,
    pub return_corrections: usize,
}

/// Result of evaluating many positions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub reports: BTreeMap<String, PositionReport>,
    /// Position id to the reason it failed.
    pub failures: BTreeMap<String, String>,
    /// Positions excluded by the override table.
    pub skipped: Vec<String>,
}

impl BatchReport {
    /// Whether every non-excluded position evaluated successfully.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Computes uncollected fees and period returns for positions.
#[derive(Debug, Clone)]
pub struct YieldEngine {
    config: AnalyticsConfig,
    policy: OverridePolicy,
    calculator: ReturnsCalculator,
}

impl YieldEngine {
    /// Creates an engine, rejecting configurations that fail validation.
    pub fn new(config: AnalyticsConfig, policy: OverridePolicy) -> Result<Self, ConfigError> {
        config.validate()?;
        let calculator = ReturnsCalculator::from_config(&config);
        Ok(Self {
            config,
            policy,
            calculator,
        })
    }

    /// Default configuration with the bundled override table.
    pub fn with_bundled_overrides() -> Result<Self, ConfigError> {
        Self::new(AnalyticsConfig::default(), OverridePolicy::bundled()?)
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn policy(&self) -> &OverridePolicy {
        &self.policy
    }

    /// Evaluates one position as of `now` (unix seconds).
    pub fn evaluate(
        &self,
        input: &PositionInput,
        now: i64,
    ) -> Result<PositionReport, AnalyticsError> {
        let uncollected = uncollected_position_fees(
            &input.pool,
            &input.ranges,
            input.decimals0,
            input.decimals1,
            &input.conversion,
            input.tvl_usd,
        )?;

        let mut events = input.events.clone();
        if self.config.include_uncollected {
            events.push(uncollected_fee_event(
                &uncollected.total,
                now,
                self.config.protocol_fee_share,
            )?);
        }

        let (returns, event_corrections, return_corrections) =
            self.returns_for_events(&input.id, &mut events, now);

        debug!(
            position = %input.id,
            events = events.len(),
            token0_usd = %uncollected.total.token0_usd,
            token1_usd = %uncollected.total.token1_usd,
            "evaluated position"
        );

        Ok(PositionReport {
            id: input.id.clone(),
            as_of: now,
            uncollected,
            returns,
            events_used: events.len(),
            event_corrections,
            return_corrections,
        })
    }

    /// Evaluates one position as of the current wall-clock time.
    pub fn evaluate_now(&self, input: &PositionInput) -> Result<PositionReport, AnalyticsError> {
        self.evaluate(input, chrono::Utc::now().timestamp())
    }

    /// Period returns for a bare event series, with both override hooks applied.
    pub fn returns(&self, position_id: &str, events: &[FeeEvent], now: i64) -> PeriodReturns {
        let mut events = events.to_vec();
        self.returns_for_events(position_id, &mut events, now).0
    }

    fn returns_for_events(
        &self,
        position_id: &str,
        events: &mut [FeeEvent],
        now: i64,
    ) -> (PeriodReturns, usize, usize) {
        let event_corrections = self.policy.apply_event_overrides(position_id, events);

        let mut returns = self.calculator.calculate(events, now);
        if self.config.cascade_zero_returns {
            cascade_zero_returns(&mut returns);
        }

        let return_corrections = self.policy.apply_return_overrides(position_id, &mut returns);
        (returns, event_corrections, return_corrections)
    }

    /// Evaluates every position, isolating failures per position.
    pub fn evaluate_batch(&self, inputs: &[PositionInput], now: i64) -> BatchReport {
        let mut batch = BatchReport::default();

        for input in inputs {
            if self.policy.is_excluded(&input.id) {
                debug!(position = %input.id, "position excluded by override table");
                batch.skipped.push(input.id.clone());
                continue;
            }

            match self.evaluate(input, now) {
                Ok(report) => {
                    batch.reports.insert(input.id.clone(), report);
                }
                Err(e) => {
                    warn!(position = %input.id, error = %e, "position evaluation failed");
                    batch.failures.insert(input.id.clone(), e.to_string());
                }
            }
        }

        info!(
            evaluated = batch.reports.len(),
            failed = batch.failures.len(),
            skipped = batch.skipped.len(),
            "batch evaluation finished"
        );
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::OverrideTable;
    use crate::uncollected::UNCOLLECTED_EVENT_ID;
    use lp_yield_domain::{Period, TickFeeState};
    use primitive_types::U256;
    use rust_decimal_macros::dec;

    const DAY: i64 = 86_400;
    const NOW: i64 = 1_700_000_000;

    fn q(n: u64) -> U256 {
        U256::from(n) << 128usize
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    /// One base range owing 5 USDC of token0 and nothing of token1.
    fn input(id: &str) -> PositionInput {
        let pool = PoolFeeState::new(0, q(1000), q(1000))
            .with_tick(-60, TickFeeState::new(q(100), q(100)))
            .with_tick(60, TickFeeState::new(q(100), q(100)));
        let base =
            LiquidityRange::new(-60, 60, 1_000_000).with_fee_growth_inside_last(q(795), q(800));

        PositionInput {
            id: id.to_string(),
            pool,
            ranges: vec![(RangeKind::Base, base)],
            decimals0: 6,
            decimals1: 6,
            conversion: ConversionContext::new(0, dec!(1), dec!(1)),
            tvl_usd: dec!(1000),
            events: vec![
                FeeEvent::new("e0", NOW - 2 * DAY, dec!(0), dec!(1000)),
                FeeEvent::new("e1", NOW - DAY, dec!(10), dec!(1000)),
            ],
        }
    }

    #[test]
    fn test_evaluate_includes_uncollected_event() {
        let engine = YieldEngine::new(AnalyticsConfig::default(), OverridePolicy::empty()).unwrap();
        let report = engine.evaluate(&input("0xpos"), NOW).unwrap();

        assert_eq!(report.uncollected.total.token0_usd, dec!(5));
        assert_eq!(report.uncollected.total.token1_usd, dec!(0));
        assert_eq!(report.events_used, 3);

        // daily only sees the synthetic event: 5 / 1000 over one day
        let daily = report.returns.get(Period::Daily).unwrap();
        assert_eq!(daily.total_period_seconds, DAY);
        assert_close(daily.fee_apr, 0.005 * 365.0);

        let weekly = report.returns.get(Period::Weekly).unwrap();
        assert_eq!(weekly.total_period_seconds, 2 * DAY);
        assert_close(weekly.cum_fee_return, 1.01 * 1.005 - 1.0);
    }

    #[test]
    fn test_evaluate_without_uncollected_event() {
        let config = AnalyticsConfig::default().with_uncollected(false);
        let engine = YieldEngine::new(config, OverridePolicy::empty()).unwrap();
        let report = engine.evaluate(&input("0xpos"), NOW).unwrap();

        assert_eq!(report.events_used, 2);
        let daily = report.returns.get(Period::Daily).unwrap();
        assert_close(daily.fee_apr, 0.01 * 365.0);
    }

    #[test]
    fn test_override_hooks_are_applied() {
        let json = format!(
            r#"{{"positions": {{"0xpos": {{
                "events": [{{"eventId": "{UNCOLLECTED_EVENT_ID}", "correction": {{"kind": "scale", "factor": 0}}}}],
                "returns": [{{"period": "monthly", "correction": {{"kind": "copyFrom", "source": "daily"}}}}]
            }}}}}}"#
        );
        let policy = OverridePolicy::from_json_str(&json).unwrap();
        let engine = YieldEngine::new(AnalyticsConfig::default(), policy).unwrap();

        let report = engine.evaluate(&input("0xpos"), NOW).unwrap();
        assert_eq!(report.event_corrections, 1);
        assert_eq!(report.return_corrections, 1);

        // the zeroed synthetic event is dropped, daily falls back to e1
        let daily = *report.returns.get(Period::Daily).unwrap();
        assert_close(daily.fee_apr, 0.01 * 365.0);
        assert_eq!(report.returns.get(Period::Monthly), Some(&daily));
    }

    #[test]
    fn test_batch_isolates_failures() {
        let table = OverrideTable {
            excluded: vec!["0xexcluded".to_string()],
            ..Default::default()
        };
        let engine =
            YieldEngine::new(AnalyticsConfig::default(), OverridePolicy::from_table(table)).unwrap();

        let mut broken = input("0xbroken");
        broken.decimals0 = 40;

        let batch = engine.evaluate_batch(&[input("0xgood"), broken, input("0xexcluded")], NOW);

        assert!(!batch.is_complete());
        assert!(batch.reports.contains_key("0xgood"));
        assert!(batch.failures["0xbroken"].contains("unsupported token decimals"));
        assert_eq!(batch.skipped, vec!["0xexcluded".to_string()]);
    }

    #[test]
    fn test_batch_survives_fees_beyond_decimal_range() {
        let engine = YieldEngine::new(AnalyticsConfig::default(), OverridePolicy::empty()).unwrap();

        // 700 * 6e25 units owed per token at decimals 0: each side fits, the total does not
        let mut huge = input("0xhuge");
        huge.decimals0 = 0;
        huge.decimals1 = 0;
        huge.ranges = vec![(
            RangeKind::Base,
            LiquidityRange::new(-60, 60, 60_000_000_000_000_000_000_000_000)
                .with_fee_growth_inside_last(q(100), q(100)),
        )];

        let batch = engine.evaluate_batch(&[input("0xgood"), huge], NOW);

        assert!(batch.is_complete());
        assert!(batch.reports.contains_key("0xgood"));
        let report = &batch.reports["0xhuge"];
        assert!(report.uncollected.ranges[0].valuation_overflow);
        assert_eq!(report.uncollected.total.token0_usd, Decimal::ZERO);
    }

    #[test]
    fn test_stale_checkpoint_keeps_historical_returns() {
        let engine = YieldEngine::new(AnalyticsConfig::default(), OverridePolicy::empty()).unwrap();

        let mut stale = input("0xstale");
        stale.decimals0 = 18;
        stale.decimals1 = 18;
        stale.ranges = vec![(
            RangeKind::Base,
            LiquidityRange::new(-60, 60, 1_000_000_000_000_000_000)
                .with_fee_growth_inside_last(q(801), q(801)),
        )];

        let report = engine.evaluate(&stale, NOW).unwrap();
        assert!(report.uncollected.ranges[0].valuation_overflow);
        assert_eq!(report.events_used, 3);

        // the zero-fee synthetic event still carries the last day
        let daily = report.returns.get(Period::Daily).unwrap();
        assert_eq!(daily.total_period_seconds, DAY);
        assert_close(daily.fee_apr, 0.0);

        let weekly = report.returns.get(Period::Weekly).unwrap();
        assert_eq!(weekly.total_period_seconds, 2 * DAY);
        assert_close(weekly.cum_fee_return, 0.01);
    }

    #[test]
    fn test_returns_applies_both_hooks() {
        let json = r#"{"positions": {"0xpos": {
            "events": [{"eventId": "e1", "correction": {"kind": "subtract", "grossFeesUSD": "5"}}],
            "returns": [{"period": "allTime", "correction": {"kind": "fixed", "value": {
                "totalPeriodSeconds": 60, "cumFeeReturn": 0.5, "feeApr": 1.5, "feeApy": 2.5
            }}}]
        }}}"#;
        let policy = OverridePolicy::from_json_str(json).unwrap();
        let engine = YieldEngine::new(AnalyticsConfig::default(), policy).unwrap();

        let events = input("0xpos").events;
        let returns = engine.returns("0xPOS", &events, NOW);

        // e1 drops from 10 to 5 USD against a 1000 USD denominator
        let daily = returns.get(Period::Daily).unwrap();
        assert_close(daily.fee_apr, 0.005 * 365.0);

        let all_time = returns.get(Period::AllTime).unwrap();
        assert_eq!(all_time.total_period_seconds, 60);
        assert_close(all_time.fee_apy, 2.5);

        // the caller's series is left untouched
        assert_eq!(events[1].gross_fees_usd, dec!(10));
    }

    #[test]
    fn test_evaluate_now_stamps_current_time() {
        let engine = YieldEngine::new(AnalyticsConfig::default(), OverridePolicy::empty()).unwrap();

        let before = chrono::Utc::now().timestamp();
        let report = engine.evaluate_now(&input("0xpos")).unwrap();
        let after = chrono::Utc::now().timestamp();

        assert!(report.as_of >= before && report.as_of <= after);
        assert_eq!(report.events_used, 3);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = AnalyticsConfig::default().with_fallback_days(0.0);
        assert!(matches!(
            YieldEngine::new(config, OverridePolicy::empty()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_bundled_engine_loads() {
        let engine = YieldEngine::with_bundled_overrides().unwrap();
        assert_eq!(engine.policy().version(), "1");
    }
}
