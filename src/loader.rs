//! CSV loading into a typed [`Dataset`]
//!
//! Column names are resolved and cells are validated here, once, so that
//! aggregation code never deals with string-keyed column access.
//!
//! ```rust
//! use metaheur_results::loader::{load_csv_reader, CsvSchema};
//!
//! let csv = "Algorithm,TaskCount,Seed,Makespan,LoadBalanceRatio,ExecutionTime_ms\n\
//!            CBO,100,42,1.2e5,0.81,350\n\
//!            HHO,100,42,1.1e5,0.77,410\n";
//! let dataset = load_csv_reader(csv.as_bytes(), &CsvSchema::five_algorithm())?;
//! assert_eq!(dataset.len(), 2);
//! assert_eq!(dataset.metric_names(), ["ExecutionTime_ms", "LoadBalanceRatio", "Makespan"]);
//! # Ok::<(), metaheur_results::Error>(())
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::experiment::{Dataset, ExperimentRecord, ScaleKey};
use crate::{Error, Result};

/// Mapping from CSV header names to record fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvSchema {
    /// Column holding the group key (algorithm / mode).
    pub group_column: String,
    /// Column holding the scale key (task count).
    pub scale_column: String,
    /// Column holding the seed.
    pub seed_column: String,
    /// Metric columns to load. Empty means every remaining column.
    #[serde(default)]
    pub metric_columns: Vec<String>,
}

impl CsvSchema {
    /// Schema with explicit key columns and all remaining columns as metrics.
    #[must_use]
    pub fn new(
        group_column: impl Into<String>,
        scale_column: impl Into<String>,
        seed_column: impl Into<String>,
    ) -> Self {
        Self {
            group_column: group_column.into(),
            scale_column: scale_column.into(),
            seed_column: seed_column.into(),
            metric_columns: Vec::new(),
        }
    }

    /// `Algorithm,TaskCount,Seed,Makespan,LoadBalanceRatio,ExecutionTime_ms`
    #[must_use]
    pub fn five_algorithm() -> Self {
        Self::new("Algorithm", "TaskCount", "Seed")
    }

    /// `Mode,Scale,Seed,Makespan,AvgLoad,MaxLoad,MinLoad,LoadBalanceRatio`
    #[must_use]
    pub fn multi_objective() -> Self {
        Self::new("Mode", "Scale", "Seed")
    }

    /// Restrict loading to the named metric columns.
    #[must_use]
    pub fn with_metrics<I, S>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metric_columns = metrics.into_iter().map(Into::into).collect();
        self
    }
}

/// Resolved column positions for one header row.
struct ColumnLayout {
    group: usize,
    scale: usize,
    seed: usize,
    metrics: Vec<(String, usize)>,
}

impl ColumnLayout {
    fn resolve(headers: &StringRecord, schema: &CsvSchema) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h == name);
        let key_column = |name: &str| {
            position(name)
                .ok_or_else(|| Error::InvalidInput(format!("missing key column '{name}'")))
        };

        let group = key_column(schema.group_column.as_str())?;
        let scale = key_column(schema.scale_column.as_str())?;
        let seed = key_column(schema.seed_column.as_str())?;

        let metrics = if schema.metric_columns.is_empty() {
            headers
                .iter()
                .enumerate()
                .filter(|(i, _)| ![group, scale, seed].contains(i))
                .map(|(i, h)| (h.to_string(), i))
                .collect()
        } else {
            schema
                .metric_columns
                .iter()
                .map(|name| {
                    position(name.as_str())
                        .map(|i| (name.clone(), i))
                        .ok_or_else(|| Error::InvalidMetric {
                            metric: name.clone(),
                            reason: "column not present in header".to_string(),
                        })
                })
                .collect::<Result<Vec<_>>>()?
        };

        Ok(Self {
            group,
            scale,
            seed,
            metrics,
        })
    }

    fn record(&self, row: &StringRecord, line: usize) -> Result<ExperimentRecord> {
        let cell = |i: usize| {
            row.get(i)
                .ok_or_else(|| Error::InvalidInput(format!("line {line}: missing column {i}")))
        };

        let seed_cell = cell(self.seed)?;
        let seed = seed_cell.parse::<u64>().map_err(|_| {
            Error::InvalidInput(format!("line {line}: seed '{seed_cell}' is not an integer"))
        })?;

        let mut builder =
            ExperimentRecord::builder(cell(self.group)?, ScaleKey::parse(cell(self.scale)?), seed);
        for (name, i) in &self.metrics {
            let raw = cell(*i)?;
            let value = raw.parse::<f64>().map_err(|_| Error::InvalidMetric {
                metric: name.clone(),
                reason: format!("line {line}: '{raw}' is not numeric"),
            })?;
            builder = builder.metric(name.as_str(), value);
        }
        builder.build()
    }
}

/// Load a dataset from any CSV source with a header row.
///
/// # Errors
/// - `InvalidInput` if a key column is missing or a seed is not an integer
/// - `InvalidMetric` if a requested metric column is missing or a cell is not numeric
/// - `EmptyDataset` if there are no data rows
/// - `Csv` on malformed CSV (e.g. ragged rows)
pub fn load_csv_reader<R: Read>(reader: R, schema: &CsvSchema) -> Result<Dataset> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let layout = ColumnLayout::resolve(reader.headers()?, schema)?;

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        // Header is line 1.
        records.push(layout.record(&row?, i + 2)?);
    }

    debug!(
        records = records.len(),
        metrics = layout.metrics.len(),
        "parsed csv rows"
    );
    Dataset::new(records)
}

/// Load a dataset from a CSV file.
///
/// # Errors
/// `Io` if the file cannot be opened, otherwise as [`load_csv_reader`].
pub fn load_csv_path<P: AsRef<Path>>(path: P, schema: &CsvSchema) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let dataset = load_csv_reader(file, schema)?;
    debug!(path = %path.display(), records = dataset.len(), "loaded results file");
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_all_remaining_columns() {
        let headers = StringRecord::from(vec!["Seed", "Algorithm", "Makespan", "TaskCount", "Cost"]);
        let layout = ColumnLayout::resolve(&headers, &CsvSchema::five_algorithm()).unwrap();
        assert_eq!(layout.group, 1);
        assert_eq!(layout.scale, 3);
        assert_eq!(layout.seed, 0);
        assert_eq!(
            layout.metrics,
            vec![("Makespan".to_string(), 2), ("Cost".to_string(), 4)]
        );
    }

    #[test]
    fn test_layout_missing_metric_column() {
        let headers = StringRecord::from(vec!["Algorithm", "TaskCount", "Seed", "Makespan"]);
        let schema = CsvSchema::five_algorithm().with_metrics(["Energy"]);
        assert!(matches!(
            ColumnLayout::resolve(&headers, &schema),
            Err(Error::InvalidMetric { ref metric, .. }) if metric == "Energy"
        ));
    }

    #[test]
    fn test_schema_from_json() {
        let schema: CsvSchema = serde_json::from_str(
            r#"{"group_column": "Mode", "scale_column": "Scale", "seed_column": "Seed"}"#,
        )
        .unwrap();
        assert_eq!(schema, CsvSchema::multi_objective());
    }
}
