//! Experiment result schema
//!
//! Typed input boundary for the aggregator: string-keyed table columns are
//! turned into records once, here, instead of in every computation.
//!
//! ## Schema Overview
//!
//! ```text
//! Dataset (1) ──< ExperimentRecord (N)
//!                     ├── group_key  (algorithm, e.g. "LSCBO-Fixed")
//!                     ├── scale_key  (task count, e.g. 100)
//!                     ├── seed
//!                     └── metrics    (Makespan, LoadBalanceRatio, ...)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use metaheur_results::experiment::{Dataset, ExperimentRecord};
//!
//! let record = ExperimentRecord::builder("CBO", 100, 42)
//!     .metric("Makespan", 1.2e5)
//!     .build()?;
//!
//! let dataset = Dataset::new(vec![record])?;
//! assert_eq!(dataset.groups(), ["CBO"]);
//! # Ok::<(), metaheur_results::Error>(())
//! ```

mod dataset;
mod experiment_record;

pub use dataset::{Dataset, DatasetSummary};
pub use experiment_record::{ExperimentRecord, ExperimentRecordBuilder, ScaleKey};
