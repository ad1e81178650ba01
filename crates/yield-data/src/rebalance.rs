use crate::parse::{RawNumber, parse_decimal, parse_i64};
use anyhow::{Context, Result};
use lp_yield_domain::FeeEvent;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A fee realization as recorded by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceRecord {
    pub id: String,
    pub timestamp: RawNumber,
    #[serde(rename = "grossFeesUSD")]
    pub gross_fees_usd: RawNumber,
    #[serde(rename = "protocolFeesUSD", default)]
    pub protocol_fees_usd: Option<RawNumber>,
    #[serde(rename = "netFeesUSD", default)]
    pub net_fees_usd: Option<RawNumber>,
    #[serde(rename = "totalAmountUSD")]
    pub total_amount_usd: RawNumber,
}

impl TryFrom<&RebalanceRecord> for FeeEvent {
    type Error = anyhow::Error;

    fn try_from(record: &RebalanceRecord) -> Result<Self> {
        let parse = || -> Result<FeeEvent> {
            let timestamp = parse_i64(&record.timestamp, "timestamp")?;
            let gross = parse_decimal(&record.gross_fees_usd, "grossFeesUSD")?;
            let total = parse_decimal(&record.total_amount_usd, "totalAmountUSD")?;
            let protocol = match &record.protocol_fees_usd {
                Some(raw) => parse_decimal(raw, "protocolFeesUSD")?,
                None => Decimal::ZERO,
            };
            let net = match &record.net_fees_usd {
                Some(raw) => parse_decimal(raw, "netFeesUSD")?,
                None => gross - protocol,
            };
            Ok(FeeEvent::new(record.id.clone(), timestamp, gross, total).with_fee_split(protocol, net))
        };
        parse().with_context(|| format!("rebalance {}", record.id))
    }
}

/// Converts a series, dropping records that fail to parse.
pub fn fee_events_lenient(records: &[RebalanceRecord]) -> Vec<FeeEvent> {
    records
        .iter()
        .filter_map(|record| match FeeEvent::try_from(record) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(rebalance = %record.id, error = %format!("{e:#}"), "Dropping malformed rebalance");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::from_json;
    use rust_decimal_macros::dec;

    const SERIES: &str = r#"[
        {"id": "0xa-1", "timestamp": "1700000000", "grossFeesUSD": "10.5",
         "protocolFeesUSD": "1.05", "netFeesUSD": "9.45", "totalAmountUSD": "1000"},
        {"id": "0xa-2", "timestamp": 1700086400, "grossFeesUSD": "12",
         "totalAmountUSD": "1100.25"},
        {"id": "0xa-3", "timestamp": "yesterday", "grossFeesUSD": "1",
         "totalAmountUSD": "1"}
    ]"#;

    #[test]
    fn test_record_to_event() {
        let records: Vec<RebalanceRecord> = from_json(SERIES).unwrap();
        let event = FeeEvent::try_from(&records[0]).unwrap();
        assert_eq!(event.id, "0xa-1");
        assert_eq!(event.timestamp, 1_700_000_000);
        assert_eq!(event.gross_fees_usd, dec!(10.5));
        assert_eq!(event.protocol_fees_usd, dec!(1.05));
        assert_eq!(event.net_fees_usd, dec!(9.45));
        assert_eq!(event.total_amount_usd, dec!(1000));
    }

    #[test]
    fn test_missing_split_defaults_to_gross() {
        let records: Vec<RebalanceRecord> = from_json(SERIES).unwrap();
        let event = FeeEvent::try_from(&records[1]).unwrap();
        assert_eq!(event.protocol_fees_usd, Decimal::ZERO);
        assert_eq!(event.net_fees_usd, dec!(12));
    }

    #[test]
    fn test_error_names_record_and_field() {
        let records: Vec<RebalanceRecord> = from_json(SERIES).unwrap();
        let err = FeeEvent::try_from(&records[2]).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("0xa-3"));
        assert!(message.contains("timestamp"));
    }

    #[test]
    fn test_lenient_drops_malformed() {
        let records: Vec<RebalanceRecord> = from_json(SERIES).unwrap();
        let events = fee_events_lenient(&records);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.id != "0xa-3"));
    }
}
