use lp_yield_domain::{FeeGrowthError, ValuationError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the evaluation of a single position.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Fee-growth resolution failed for a reason other than a missing tick.
    #[error("fee growth resolution failed: {0}")]
    FeeGrowth(#[from] FeeGrowthError),
    /// USD valuation failed.
    #[error("valuation failed: {0}")]
    Valuation(#[from] ValuationError),
}

/// Errors raised while loading configuration documents.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid JSON for the expected shape.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// The document parsed but holds an unusable value.
    #[error("invalid configuration value: {0}")]
    Invalid(String),
}
