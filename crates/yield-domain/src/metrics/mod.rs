pub mod valuation;

pub use valuation::{FeeValuation, UncollectedFeesUsd, value_fees};
