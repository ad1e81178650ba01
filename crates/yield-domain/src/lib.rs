//! Core domain types for concentrated liquidity fee accounting.
//!
//! This crate provides the leaf building blocks of the yield engine:
//! - Fee-growth state for pools and liquidity ranges
//! - Uncollected fee resolution from 2^128-scaled counters
//! - USD valuation of raw token amounts
//! - Fee realization events and period return values

/// Base/quote conversion rules.
pub mod conversion;
/// Domain error types.
pub mod error;
/// Fee realization events.
pub mod event;
/// Fixed-point fee-growth math.
pub mod math;
/// Valuation metrics.
pub mod metrics;
/// Pool fee accounting state.
pub mod pool;
/// Liquidity ranges.
pub mod position;
/// Period return values.
pub mod returns;
/// Token amounts.
pub mod token;

pub use conversion::{BaseToken, ConversionContext};
pub use error::{FeeGrowthError, ValuationError};
pub use event::FeeEvent;
pub use pool::{PoolFeeState, TickFeeState};
pub use position::{LiquidityRange, RangeKind};
pub use returns::{Period, PeriodReturn, PeriodReturns};
pub use token::TokenAmount;
