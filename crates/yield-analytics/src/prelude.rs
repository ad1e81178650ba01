//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use lp_yield_analytics::prelude::*;
//! ```

// Configuration
pub use crate::config::{AnalyticsConfig, DenominatorShift, PeriodWindow};

// Engine
pub use crate::engine::{BatchReport, PositionInput, PositionReport, YieldEngine};

// Errors
pub use crate::error::{AnalyticsError, ConfigError};

// Overrides
pub use crate::overrides::{
    EventCorrection, EventOverride, OverridePolicy, OverrideTable, PeriodCorrection,
    PeriodOverride, PositionOverrides,
};

// Returns
pub use crate::returns::{ReturnsCalculator, cascade_zero_returns};

// Uncollected fees
pub use crate::uncollected::{
    PositionUncollectedFees, RangeFees, UNCOLLECTED_EVENT_ID, uncollected_fee_event,
    uncollected_position_fees,
};

// Domain
pub use lp_yield_domain::{
    ConversionContext, FeeEvent, LiquidityRange, Period, PeriodReturn, PeriodReturns,
    PoolFeeState, RangeKind, TickFeeState, TokenAmount,
};
