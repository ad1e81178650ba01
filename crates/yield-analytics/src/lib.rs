//! Fee-accrual and yield analytics for managed liquidity positions.
//!
//! This crate provides:
//! - Uncollected fee aggregation across base and limit ranges
//! - Period-bucketed fee APR/APY from irregular fee realization events
//! - A keyed override table applied at two fixed pipeline hooks
//! - A per-position and batch engine with failure isolation
//! - JSON configuration

/// Prelude module for convenient imports.
pub mod prelude;

/// Engine configuration.
pub mod config;
/// Per-position and batch evaluation.
pub mod engine;
/// Error types.
pub mod error;
/// Known data corrections.
pub mod overrides;
/// Period return calculation.
pub mod returns;
/// Uncollected fee aggregation.
pub mod uncollected;

pub use config::{AnalyticsConfig, DenominatorShift, PeriodWindow};
pub use engine::{BatchReport, PositionInput, PositionReport, YieldEngine};
pub use error::{AnalyticsError, ConfigError};
pub use overrides::{OverridePolicy, OverrideTable};
pub use returns::ReturnsCalculator;
