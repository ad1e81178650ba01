//! Period-bucketed fee returns from irregular fee realization events.
//!
//! Realization events arrive at irregular intervals, so a rigid window often
//! holds zero or one point. Each period resolves its window through a layered
//! fallback before compounding the per-event fee rates inside it.

use crate::config::{
    AnalyticsConfig, DenominatorShift, PeriodWindow, SECONDS_PER_DAY, SECONDS_PER_YEAR,
    lookback_seconds,
};
use lp_yield_domain::{FeeEvent, Period, PeriodReturn, PeriodReturns};
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, warn};

/// An event reduced to the floats used by ratio math.
#[derive(Debug, Clone, Copy)]
struct Observation {
    timestamp: i64,
    gross_fees_usd: f64,
    total_amount_usd: f64,
}

impl Observation {
    fn from_event(event: &FeeEvent) -> Option<Self> {
        if !event.is_usable() {
            return None;
        }
        Some(Self {
            timestamp: event.timestamp,
            gross_fees_usd: event.gross_fees_usd.to_f64()?,
            total_amount_usd: event.total_amount_usd.to_f64()?,
        })
    }
}

/// Per-event rates derived from the sorted series.
#[derive(Debug, Clone, Copy)]
struct ReturnRow {
    timestamp: i64,
    /// Gross fees over the denominator event's total amount.
    fee_rate: Option<f64>,
    /// Growth of the total amount against the denominator event.
    total_rate: Option<f64>,
    /// Seconds since the previous event.
    period_seconds: Option<i64>,
}

/// Computes fee APR/APY per period from a series of fee events.
#[derive(Debug, Clone)]
pub struct ReturnsCalculator {
    shift: DenominatorShift,
    fallback_seconds: i64,
    periods: Vec<PeriodWindow>,
}

impl ReturnsCalculator {
    /// Creates a calculator with default periods and a one-day fallback.
    pub fn new(shift: DenominatorShift) -> Self {
        Self::from_config(&AnalyticsConfig::default().with_shift(shift))
    }

    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self {
            shift: config.denominator_shift,
            fallback_seconds: config.fallback_seconds(),
            periods: config.periods.clone(),
        }
    }

    /// Sets the fallback lookback in days.
    ///
    /// Negative and non-finite values are treated as no lookback, so only the
    /// day before the latest event remains as a window.
    #[must_use]
    pub fn with_fallback_days(mut self, days: f64) -> Self {
        self.fallback_seconds = lookback_seconds(days);
        self
    }

    /// Computes returns for every configured period as of `now` (unix seconds).
    ///
    /// Events without a positive total amount are dropped. Fewer than two
    /// usable events yield the canonical empty result.
    pub fn calculate(&self, events: &[FeeEvent], now: i64) -> PeriodReturns {
        let mut observations: Vec<Observation> =
            events.iter().filter_map(Observation::from_event).collect();

        if observations.len() < 2 {
            debug!(
                usable = observations.len(),
                total = events.len(),
                "not enough fee events for returns"
            );
            return self.empty_result();
        }

        observations.sort_by_key(|o| o.timestamp);

        let rows = self.build_rows(&observations);
        // rows is non-empty and sorted
        let latest = rows[rows.len() - 1].timestamp;

        let mut results = PeriodReturns::default();
        for window in &self.periods {
            let start = self.resolve_window_start(&rows, now, latest, window.seconds());
            let value = window_return(&rows, start);

            debug!(
                period = %window.period,
                window_start = start,
                total_period_seconds = value.total_period_seconds,
                cum_fee_return = value.cum_fee_return,
                cum_total_return = cum_total_return(&rows, start),
                "computed period return"
            );

            results.insert(window.period, value);
        }

        self.replace_divergent(&mut results);
        results
    }

    fn empty_result(&self) -> PeriodReturns {
        self.periods
            .iter()
            .map(|window| (window.period, PeriodReturn::empty()))
            .collect()
    }

    fn build_rows(&self, observations: &[Observation]) -> Vec<ReturnRow> {
        let offset = self.shift.offset();

        observations
            .iter()
            .enumerate()
            .map(|(i, current)| {
                let denominator = i.checked_sub(offset).map(|j| observations[j]);
                let previous = i.checked_sub(1).map(|j| observations[j]);

                ReturnRow {
                    timestamp: current.timestamp,
                    fee_rate: denominator.map(|d| current.gross_fees_usd / d.total_amount_usd),
                    total_rate: denominator
                        .map(|d| current.total_amount_usd / d.total_amount_usd - 1.0),
                    period_seconds: previous.map(|p| current.timestamp - p.timestamp),
                }
            })
            .collect()
    }

    /// Resolves the exclusive lower bound of a period window.
    ///
    /// The nominal `now - window` bound is used when it holds at least two
    /// events; otherwise the window is anchored at the latest event and, if
    /// still empty, narrowed to the day before it.
    fn resolve_window_start(
        &self,
        rows: &[ReturnRow],
        now: i64,
        latest: i64,
        window_seconds: i64,
    ) -> i64 {
        let count_after = |start: i64| rows.iter().filter(|r| r.timestamp > start).count();

        let mut start = now.saturating_sub(window_seconds);
        if count_after(start) < 2 {
            start = latest.saturating_sub(self.fallback_seconds);
        }
        // only reachable when the lookback rounds to zero seconds
        if count_after(start) == 0 {
            start = latest.saturating_sub(SECONDS_PER_DAY);
        }
        start
    }

    /// Substitutes divergent annualizations with the next shorter period.
    fn replace_divergent(&self, results: &mut PeriodReturns) {
        for window in &self.periods {
            let Some(value) = results.get(window.period) else {
                continue;
            };
            if !value.is_divergent() {
                continue;
            }

            let substitute = window
                .period
                .shorter()
                .and_then(|shorter| results.get(shorter).map(|v| (shorter, *v)))
                .filter(|(_, v)| !v.is_divergent());

            match substitute {
                Some((shorter, replacement)) => {
                    warn!(
                        period = %window.period,
                        substitute = %shorter,
                        "divergent annualization, using shorter period"
                    );
                    results.insert(window.period, replacement);
                }
                None => {
                    warn!(period = %window.period, "divergent annualization, returning empty");
                    results.insert(window.period, PeriodReturn::empty());
                }
            }
        }
    }
}

/// Compounds the fee rates of rows after `start` and annualizes them.
fn window_return(rows: &[ReturnRow], start: i64) -> PeriodReturn {
    let mut total_period_seconds = 0i64;
    let mut growth = 1.0f64;

    for row in rows.iter().filter(|r| r.timestamp > start) {
        total_period_seconds += row.period_seconds.unwrap_or(0);
        if let Some(rate) = row.fee_rate {
            growth *= 1.0 + rate;
        }
    }

    let cum_fee_return = growth - 1.0;
    let seconds = total_period_seconds as f64;

    let fee_apr = cum_fee_return * (SECONDS_PER_YEAR as f64 / seconds);
    let fee_apy = (1.0 + cum_fee_return * (SECONDS_PER_DAY as f64 / seconds)).powi(365) - 1.0;

    PeriodReturn {
        total_period_seconds,
        cum_fee_return,
        fee_apr,
        fee_apy,
    }
}

fn cum_total_return(rows: &[ReturnRow], start: i64) -> f64 {
    rows.iter()
        .filter(|r| r.timestamp > start)
        .filter_map(|r| r.total_rate)
        .fold(1.0, |acc, rate| acc * (1.0 + rate))
        - 1.0
}

/// Fills zero-APR periods from the next shorter period.
///
/// A weekly result with zero APR takes the daily result, a monthly one takes
/// the weekly result, and all-time always mirrors monthly.
pub fn cascade_zero_returns(returns: &mut PeriodReturns) {
    for (period, source) in [
        (Period::Weekly, Period::Daily),
        (Period::Monthly, Period::Weekly),
    ] {
        let is_zero = returns.get(period).is_some_and(|v| v.fee_apr == 0.0);
        if let (true, Some(replacement)) = (is_zero, returns.get(source).copied()) {
            returns.insert(period, replacement);
        }
    }

    if let Some(monthly) = returns.get(Period::Monthly).copied() {
        returns.insert(Period::AllTime, monthly);
    }
}
