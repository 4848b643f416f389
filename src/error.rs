//! Error types for metaheur-results
//!
//! Every failure is a contract violation of the input data or the request;
//! nothing here is transient, so nothing is retried.

use crate::experiment::ScaleKey;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// metaheur-results error types
#[derive(Error, Debug)]
pub enum Error {
    /// Dataset has zero records
    #[error("Empty dataset: at least one experiment record is required")]
    EmptyDataset,

    /// Metric column missing or not numeric
    #[error("Invalid metric '{metric}': {reason}")]
    InvalidMetric {
        /// Requested metric name
        metric: String,
        /// What was wrong with it
        reason: String,
    },

    /// No record carries the requested scale key
    #[error("Unknown scale: no records with scale key {0}")]
    UnknownScale(ScaleKey),

    /// Group key absent from the (possibly scale-restricted) data
    #[error("Unknown group '{group}'{}", scale_suffix(.scale.as_ref()))]
    UnknownGroup {
        /// Requested group key
        group: String,
        /// Scale restriction in effect, if any
        scale: Option<ScaleKey>,
    },

    /// Baseline mean (or dispersion mean) is exactly zero
    #[error("Division by zero: mean of group '{group}' is 0")]
    DivisionByZero {
        /// Group whose mean is zero
        group: String,
    },

    /// Too few records for a sample statistic
    #[error("Insufficient samples for group '{group}': need at least 2, found {found}")]
    InsufficientSamples {
        /// Requested group key
        group: String,
        /// Number of matching records
        found: usize,
    },

    /// Malformed request or input table
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn scale_suffix(scale: Option<&ScaleKey>) -> String {
    scale.map_or_else(String::new, |s| format!(" at scale {s}"))
}
