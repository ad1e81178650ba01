//! Ledger record shapes and their conversion into domain types.
//!
//! Records mirror the source ledger exactly: big integers and USD amounts are
//! decimal strings, small integers may be strings or JSON numbers. Conversion
//! is strict and names the offending field; fee-growth counters are parsed
//! straight into 256-bit integers and never pass through floating point.

/// Numeric field parsing.
pub mod parse;
/// Position and pool tick records.
pub mod position;
/// Fee realization records.
pub mod rebalance;

pub use parse::RawNumber;
pub use position::{
    ConversionRecord, PoolRef, PoolStateRecord, PoolTickRecord, PositionFeeRecord, TickRecord,
    TokenRecord, build_position_input,
};
pub use rebalance::{RebalanceRecord, fee_events_lenient};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Deserializes a ledger document.
pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).with_context(|| {
        format!(
            "failed to decode {} from ledger JSON",
            std::any::type_name::<T>()
        )
    })
}
