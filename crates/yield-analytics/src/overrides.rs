//! Known data corrections, keyed by position and event identifier.
//!
//! The table is configuration, versioned apart from the calculation engine.
//! It is applied at exactly two hooks: on raw fee events before returns are
//! computed, and on the computed period returns afterwards.

use crate::error::ConfigError;
use lp_yield_domain::{FeeEvent, Period, PeriodReturn, PeriodReturns};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, warn};

const BUNDLED_TABLE: &str = include_str!("../config/overrides.json");

/// Correction applied to one raw fee event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EventCorrection {
    /// Removes a known duplicated USD amount from the event's fields.
    Subtract {
        #[serde(default, rename = "grossFeesUSD")]
        gross_fees_usd: Decimal,
        #[serde(default, rename = "protocolFeesUSD")]
        protocol_fees_usd: Decimal,
        #[serde(default, rename = "netFeesUSD")]
        net_fees_usd: Decimal,
        #[serde(default, rename = "totalAmountUSD")]
        total_amount_usd: Decimal,
    },
    /// Multiplies every USD field of the event.
    Scale { factor: Decimal },
}

impl EventCorrection {
    /// Returns the corrected event, or `None` if the arithmetic overflows.
    fn apply(&self, event: &FeeEvent) -> Option<FeeEvent> {
        let mut out = event.clone();
        match self {
            Self::Subtract {
                gross_fees_usd,
                protocol_fees_usd,
                net_fees_usd,
                total_amount_usd,
            } => {
                out.gross_fees_usd = event.gross_fees_usd.checked_sub(*gross_fees_usd)?;
                out.protocol_fees_usd = event.protocol_fees_usd.checked_sub(*protocol_fees_usd)?;
                out.net_fees_usd = event.net_fees_usd.checked_sub(*net_fees_usd)?;
                out.total_amount_usd = event.total_amount_usd.checked_sub(*total_amount_usd)?;
            }
            Self::Scale { factor } => {
                out.gross_fees_usd = event.gross_fees_usd.checked_mul(*factor)?;
                out.protocol_fees_usd = event.protocol_fees_usd.checked_mul(*factor)?;
                out.net_fees_usd = event.net_fees_usd.checked_mul(*factor)?;
                out.total_amount_usd = event.total_amount_usd.checked_mul(*factor)?;
            }
        }
        Some(out)
    }
}

/// An event correction bound to an event identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventOverride {
    pub event_id: String,
    pub correction: EventCorrection,
}

/// Correction applied to one computed period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PeriodCorrection {
    /// Uses another period's value, for histories too sparse for the nominal window.
    CopyFrom { source: Period },
    /// Uses a literal value.
    Fixed { value: PeriodReturn },
}

/// A period correction bound to the period it replaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodOverride {
    pub period: Period,
    pub correction: PeriodCorrection,
}

/// All corrections for one position.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionOverrides {
    #[serde(default)]
    pub events: Vec<EventOverride>,
    /// Applied in order; later entries see the effect of earlier ones.
    #[serde(default)]
    pub returns: Vec<PeriodOverride>,
}

/// Serialized form of the override table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverrideTable {
    #[serde(default)]
    pub version: String,
    /// Positions left out of batch evaluation entirely.
    #[serde(default)]
    pub excluded: Vec<String>,
    #[serde(default)]
    pub positions: BTreeMap<String, PositionOverrides>,
}

/// Read-only lookup over an [`OverrideTable`].
///
/// Position identifiers are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct OverridePolicy {
    version: String,
    excluded: BTreeSet<String>,
    positions: BTreeMap<String, PositionOverrides>,
}

impl OverridePolicy {
    /// A policy with no corrections.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The table shipped with the crate.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_json_str(BUNDLED_TABLE)
    }

    pub fn from_table(table: OverrideTable) -> Self {
        Self {
            version: table.version,
            excluded: table.excluded.iter().map(|id| normalize(id)).collect(),
            positions: table
                .positions
                .into_iter()
                .map(|(id, overrides)| (normalize(&id), overrides))
                .collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let table: OverrideTable = serde_json::from_str(json)?;
        Ok(Self::from_table(table))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_excluded(&self, position_id: &str) -> bool {
        self.excluded.contains(&normalize(position_id))
    }

    fn lookup(&self, position_id: &str) -> Option<&PositionOverrides> {
        self.positions.get(&normalize(position_id))
    }

    /// First hook: corrects raw fee events in place.
    ///
    /// Returns the number of events corrected.
    pub fn apply_event_overrides(&self, position_id: &str, events: &mut [FeeEvent]) -> usize {
        let Some(overrides) = self.lookup(position_id) else {
            return 0;
        };

        let mut applied = 0;
        for entry in &overrides.events {
            for event in events.iter_mut().filter(|e| e.id == entry.event_id) {
                match entry.correction.apply(event) {
                    Some(corrected) => {
                        debug!(
                            position = position_id,
                            event = %event.id,
                            "applied event correction"
                        );
                        *event = corrected;
                        applied += 1;
                    }
                    None => warn!(
                        position = position_id,
                        event = %event.id,
                        "event correction overflowed, left unchanged"
                    ),
                }
            }
        }
        applied
    }

    /// Second hook: corrects computed period returns in place.
    ///
    /// Returns the number of periods replaced.
    pub fn apply_return_overrides(&self, position_id: &str, returns: &mut PeriodReturns) -> usize {
        let Some(overrides) = self.lookup(position_id) else {
            return 0;
        };

        let mut applied = 0;
        for entry in &overrides.returns {
            let replacement = match &entry.correction {
                PeriodCorrection::CopyFrom { source } => returns.get(*source).copied(),
                PeriodCorrection::Fixed { value } => Some(*value),
            };

            match replacement {
                Some(value) => {
                    debug!(
                        position = position_id,
                        period = %entry.period,
                        "applied period correction"
                    );
                    returns.insert(entry.period, value);
                    applied += 1;
                }
                None => warn!(
                    position = position_id,
                    period = %entry.period,
                    "period correction source missing, skipped"
                ),
            }
        }
        applied
    }
}

fn normalize(id: &str) -> String {
    id.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    const SCALED_POSITION: &str = "0x0ec4a47065bf52e1874d2491d4deeed3c638c75f";
    const SCALED_EVENT: &str =
        "0x9144d5c6a7e8ffd335c837c5877397e96ea3abbc77c9598b07255add6db3fc13-15";

    fn sample_return(apr: f64) -> PeriodReturn {
        PeriodReturn {
            total_period_seconds: 86_400,
            cum_fee_return: apr / 365.0,
            fee_apr: apr,
            fee_apy: apr * 1.1,
        }
    }

    #[test]
    fn test_bundled_table_scales_known_event() {
        let policy = OverridePolicy::bundled().unwrap();
        let mut events = vec![
            FeeEvent::new(SCALED_EVENT, 10, dec!(1000), dec!(50000))
                .with_fee_split(dec!(100), dec!(900)),
            FeeEvent::new("other", 20, dec!(10), dec!(50000)),
        ];

        let applied = policy.apply_event_overrides(SCALED_POSITION, &mut events);

        assert_eq!(applied, 1);
        assert_eq!(events[0].gross_fees_usd, dec!(80));
        assert_eq!(events[0].protocol_fees_usd, dec!(8));
        assert_eq!(events[0].net_fees_usd, dec!(72));
        assert_eq!(events[0].total_amount_usd, dec!(4000));
        assert_eq!(events[1].gross_fees_usd, dec!(10));
    }

    #[test]
    fn test_bundled_table_fixed_then_copy() {
        let policy = OverridePolicy::bundled().unwrap();
        let mut returns = PeriodReturns::empty();
        returns.insert(Period::Daily, sample_return(2.0));

        let applied = policy
            .apply_return_overrides("0x717A3276BD6F9E2F0AE447E0FFB45D0FA1C2DC57", &mut returns);

        assert_eq!(applied, 2);
        let daily = *returns.get(Period::Daily).unwrap();
        assert_eq!(daily.total_period_seconds, 629_817);
        // weekly copies the already-corrected daily value
        assert_eq!(returns.get(Period::Weekly), Some(&daily));
    }

    #[test]
    fn test_subtract_duplicated_amount() {
        let json = r#"{
            "positions": {
                "0xabc": {
                    "events": [{
                        "eventId": "dup",
                        "correction": {"kind": "subtract", "grossFeesUSD": "40", "netFeesUSD": 36}
                    }]
                }
            }
        }"#;
        let policy = OverridePolicy::from_json_str(json).unwrap();
        let mut events = vec![
            FeeEvent::new("dup", 1, dec!(100), dec!(1000)).with_fee_split(dec!(10), dec!(90)),
        ];

        assert_eq!(policy.apply_event_overrides("0xABC", &mut events), 1);
        assert_eq!(events[0].gross_fees_usd, dec!(60));
        assert_eq!(events[0].protocol_fees_usd, dec!(10));
        assert_eq!(events[0].net_fees_usd, dec!(54));
        assert_eq!(events[0].total_amount_usd, dec!(1000));
    }

    #[test]
    fn test_unknown_position_is_untouched() {
        let policy = OverridePolicy::bundled().unwrap();
        let mut returns = PeriodReturns::empty();
        returns.insert(Period::Daily, sample_return(1.0));
        let before = returns.clone();

        assert_eq!(policy.apply_return_overrides("0xnobody", &mut returns), 0);
        assert_eq!(returns, before);
    }

    #[test]
    fn test_exclusion_is_case_insensitive() {
        let table = OverrideTable {
            excluded: vec!["0xDEAD".to_string()],
            ..Default::default()
        };
        let policy = OverridePolicy::from_table(table);
        assert!(policy.is_excluded("0xdead"));
        assert!(!policy.is_excluded("0xbeef"));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"version": "7", "excluded": ["0x1"]}}"#).unwrap();

        let policy = OverridePolicy::from_path(file.path()).unwrap();
        assert_eq!(policy.version(), "7");
        assert!(policy.is_excluded("0x1"));
    }

    #[test]
    fn test_rejects_unknown_correction_kind() {
        let json = r#"{"positions": {"0x1": {"returns": [
            {"period": "daily", "correction": {"kind": "invert"}}
        ]}}}"#;
        assert!(matches!(
            OverridePolicy::from_json_str(json),
            Err(ConfigError::Parse(_))
        ));
    }
}
