// File: crates/chart-data/src/error.rs
// Summary: Configuration errors raised while building a data model or series.

use thiserror::Error;

/// Invalid configuration. Raised synchronously when a model or series is
/// constructed; never raised while processing data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("data model requires at least one key property")]
    NoKeys,

    #[error("sum definition must name at least one property")]
    EmptySum,

    #[error("sum property `{0}` is not a value property")]
    UnknownSumProperty(String),

    #[error("`{0}` reducer requires at least one sum definition")]
    ReducerRequiresSum(&'static str),

    #[error("normaliseTo must be a finite positive number, got {0}")]
    InvalidNormaliseTo(f64),

    #[error("normaliseTo requires groupByKeys")]
    NormaliseRequiresGrouping,

    #[error("expecting a histogram aggregation keyword such as 'count', 'sum' or 'mean', got `{0}`")]
    UnknownAggregation(String),

    #[error("bin {index} is invalid: [{lo}, {hi}]")]
    InvalidBin { index: usize, lo: f64, hi: f64 },

    #[error("bin {index} starts before the previous bin ends")]
    UnorderedBins { index: usize },

    #[error("binCount must be a positive integer")]
    ZeroBinCount,

    #[error("`{0}` must not be empty")]
    MissingKey(&'static str),
}
