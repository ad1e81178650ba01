use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A discrete moment at which fees were realized for a position.
///
/// USD amounts are kept at full decimal precision; ratio math converts them
/// to floating point later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEvent {
    pub id: String,
    /// Unix seconds.
    pub timestamp: i64,
    #[serde(rename = "grossFeesUSD")]
    pub gross_fees_usd: Decimal,
    #[serde(rename = "protocolFeesUSD")]
    pub protocol_fees_usd: Decimal,
    #[serde(rename = "netFeesUSD")]
    pub net_fees_usd: Decimal,
    #[serde(rename = "totalAmountUSD")]
    pub total_amount_usd: Decimal,
}

impl FeeEvent {
    pub fn new(
        id: impl Into<String>,
        timestamp: i64,
        gross_fees_usd: Decimal,
        total_amount_usd: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            gross_fees_usd,
            protocol_fees_usd: Decimal::ZERO,
            net_fees_usd: gross_fees_usd,
            total_amount_usd,
        }
    }

    /// Sets the protocol and net fee split.
    #[must_use]
    pub fn with_fee_split(mut self, protocol_fees_usd: Decimal, net_fees_usd: Decimal) -> Self {
        self.protocol_fees_usd = protocol_fees_usd;
        self.net_fees_usd = net_fees_usd;
        self
    }

    /// An event is usable for return calculations when it carries a positive
    /// total amount and its gross fees convert to a finite float.
    pub fn is_usable(&self) -> bool {
        self.total_amount_usd > Decimal::ZERO
            && self.gross_fees_usd.to_f64().is_some_and(f64::is_finite)
            && self.total_amount_usd.to_f64().is_some_and(f64::is_finite)
    }
}
