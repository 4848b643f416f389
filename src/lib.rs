//! # metaheur-results: experiment result aggregation
//!
//! Post-hoc analysis of metaheuristic scheduling experiments (CBO,
//! LSCBO-Fixed, HHO, AOA, GTO, ...). Result tables are loaded once into an
//! immutable, typed [`Dataset`](experiment::Dataset); the
//! [`ResultAggregator`](aggregate::ResultAggregator) then derives
//! grouped averages, per-scale and overall rankings, improvement rates and
//! dispersion.
//!
//! ## Design Principles
//!
//! - **Validate at the boundary**: column lookup and numeric parsing happen in
//!   the loader, aggregation only sees typed records
//! - **Pure operations**: no caching, no shared mutable state; outputs are
//!   plain structured values, never formatted text
//! - **Strict failure**: an operation either returns a complete answer or an
//!   [`Error`]
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use metaheur_results::aggregate::ResultAggregator;
//! use metaheur_results::loader::{load_csv_path, CsvSchema};
//!
//! let dataset = load_csv_path("results/five_algorithm_comparison.csv", &CsvSchema::five_algorithm())?;
//! let aggregator = ResultAggregator::new();
//!
//! for entry in aggregator.overall_rank(&dataset, "Makespan")? {
//!     println!("{}: mean rank {:.2}", entry.group, entry.mean_rank);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod aggregate;
pub mod config;
pub mod error;
pub mod experiment;
pub mod loader;
pub mod report;

pub use error::{Error, Result};
