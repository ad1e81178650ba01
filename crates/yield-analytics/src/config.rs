//! Engine configuration.
//!
//! Values are read once at call time and never mutated by the engine.

use crate::error::ConfigError;
use lp_yield_domain::Period;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Seconds in a day.
pub const SECONDS_PER_DAY: i64 = 86_400;
/// Seconds in a 365-day year.
pub const SECONDS_PER_YEAR: i64 = 365 * SECONDS_PER_DAY;

/// Which earlier event supplies the `totalAmountUSD` denominator of a fee rate.
///
/// Ledgers differ in whether an event's total amount is recorded before or
/// after its own fees were realized, so the offset is chosen per data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DenominatorShift {
    /// The event's own total amount (offset 0).
    SameEvent,
    /// The preceding event's total amount (offset 1).
    PreviousEvent,
}

impl DenominatorShift {
    /// Number of positions back the denominator event sits.
    pub fn offset(&self) -> usize {
        match self {
            Self::SameEvent => 0,
            Self::PreviousEvent => 1,
        }
    }
}

impl TryFrom<u8> for DenominatorShift {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::SameEvent),
            1 => Ok(Self::PreviousEvent),
            other => Err(format!("denominator shift must be 0 or 1, got {other}")),
        }
    }
}

impl From<DenominatorShift> for u8 {
    fn from(shift: DenominatorShift) -> Self {
        shift.offset() as u8
    }
}

/// Nominal window of a named period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodWindow {
    pub period: Period,
    pub days: f64,
}

impl PeriodWindow {
    pub fn new(period: Period, days: f64) -> Self {
        Self { period, days }
    }

    pub fn seconds(&self) -> i64 {
        days_to_seconds(self.days)
    }
}

pub(crate) fn days_to_seconds(days: f64) -> i64 {
    (days * SECONDS_PER_DAY as f64).round() as i64
}

/// Like [`days_to_seconds`], but negative and non-finite lengths become zero.
pub(crate) fn lookback_seconds(days: f64) -> i64 {
    if days.is_finite() {
        days_to_seconds(days).max(0)
    } else {
        0
    }
}

/// Configuration for return calculation and position evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyticsConfig {
    /// Offset of the fee-rate denominator event.
    pub denominator_shift: DenominatorShift,
    /// Lookback, in days before the latest event, used when a nominal window
    /// holds fewer than two events.
    pub fallback_days: f64,
    /// Periods to compute, shortest first.
    pub periods: Vec<PeriodWindow>,
    /// Append a synthetic event built from uncollected fees at "now".
    pub include_uncollected: bool,
    /// Share of gross uncollected fees attributed to the protocol.
    pub protocol_fee_share: Decimal,
    /// Replace zero-APR weekly/monthly results with the next shorter period.
    pub cascade_zero_returns: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            denominator_shift: DenominatorShift::PreviousEvent,
            fallback_days: 1.0,
            periods: Period::ALL
                .iter()
                .map(|p| PeriodWindow::new(*p, f64::from(p.nominal_days())))
                .collect(),
            include_uncollected: true,
            protocol_fee_share: Decimal::new(1, 1), // 10%
            cascade_zero_returns: false,
        }
    }
}

impl AnalyticsConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Sets the denominator shift.
    #[must_use]
    pub fn with_shift(mut self, shift: DenominatorShift) -> Self {
        self.denominator_shift = shift;
        self
    }

    /// Sets the fallback lookback in days.
    #[must_use]
    pub fn with_fallback_days(mut self, days: f64) -> Self {
        self.fallback_days = days;
        self
    }

    /// Enables or disables the synthetic uncollected-fee event.
    #[must_use]
    pub fn with_uncollected(mut self, include: bool) -> Self {
        self.include_uncollected = include;
        self
    }

    /// Enables or disables the zero-return cascade.
    #[must_use]
    pub fn with_zero_cascade(mut self, enabled: bool) -> Self {
        self.cascade_zero_returns = enabled;
        self
    }

    /// Fallback lookback in seconds, zero when `fallback_days` is unusable.
    pub fn fallback_seconds(&self) -> i64 {
        lookback_seconds(self.fallback_days)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fallback_days.is_finite() && self.fallback_days > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fallbackDays must be positive, got {}",
                self.fallback_days
            )));
        }

        if self.periods.is_empty() {
            return Err(ConfigError::Invalid("no periods configured".to_string()));
        }

        let mut seen = BTreeSet::new();
        for window in &self.periods {
            if !(window.days.is_finite() && window.days > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "period {} has non-positive length {}",
                    window.period, window.days
                )));
            }
            if !seen.insert(window.period) {
                return Err(ConfigError::Invalid(format!(
                    "period {} configured twice",
                    window.period
                )));
            }
        }

        if self.protocol_fee_share < Decimal::ZERO || self.protocol_fee_share > Decimal::ONE {
            return Err(ConfigError::Invalid(format!(
                "protocolFeeShare must be within [0, 1], got {}",
                self.protocol_fee_share
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AnalyticsConfig::default();
        assert_eq!(config.denominator_shift, DenominatorShift::PreviousEvent);
        assert_eq!(config.periods.len(), 4);
        assert_eq!(config.periods[3].period, Period::AllTime);
        assert_eq!(config.periods[3].seconds(), 2000 * SECONDS_PER_DAY);
        assert_eq!(config.fallback_seconds(), SECONDS_PER_DAY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fallback_seconds_never_negative() {
        let config = AnalyticsConfig::default().with_fallback_days(-2.0);
        assert!(config.validate().is_err());
        assert_eq!(config.fallback_seconds(), 0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            AnalyticsConfig::from_json_str(r#"{"denominatorShift": 0, "fallbackDays": 3}"#)
                .unwrap();
        assert_eq!(config.denominator_shift, DenominatorShift::SameEvent);
        assert_eq!(config.fallback_seconds(), 3 * SECONDS_PER_DAY);
        assert!(config.include_uncollected);
        assert_eq!(config.periods.len(), 4);
    }

    #[test]
    fn test_rejects_bad_shift() {
        let err = AnalyticsConfig::from_json_str(r#"{"denominatorShift": 2}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_rejects_duplicate_periods() {
        let json = r#"{"periods": [
            {"period": "daily", "days": 1},
            {"period": "daily", "days": 2}
        ]}"#;
        let err = AnalyticsConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"cascadeZeroReturns": true}}"#).unwrap();

        let config = AnalyticsConfig::from_path(file.path()).unwrap();
        assert!(config.cascade_zero_returns);
    }

    #[test]
    fn test_from_missing_path() {
        let err = AnalyticsConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
