//! Result aggregation: grouped averages, rankings, improvement rates
//!
//! [`ResultAggregator`] holds only configuration. Every operation takes the
//! dataset by shared reference and returns a freshly built value, so calling
//! the same operation twice on the same dataset gives bit-identical results.
//!
//! ## Example
//!
//! ```rust
//! use metaheur_results::aggregate::{GroupField, KeyValue, ResultAggregator, SortOrder};
//! use metaheur_results::experiment::{Dataset, ExperimentRecord, ScaleKey};
//!
//! # fn main() -> metaheur_results::Result<()> {
//! let rows = [("A", 10.0), ("A", 20.0), ("B", 5.0), ("B", 5.0)];
//! let records = rows
//!     .iter()
//!     .enumerate()
//!     .map(|(seed, (group, makespan))| {
//!         ExperimentRecord::builder(*group, 1, seed as u64)
//!             .metric("Makespan", *makespan)
//!             .build()
//!     })
//!     .collect::<metaheur_results::Result<Vec<_>>>()?;
//! let dataset = Dataset::new(records)?;
//!
//! let aggregator = ResultAggregator::new();
//! let averages = aggregator.average_by(&dataset, &[GroupField::Group], "Makespan")?;
//! assert_eq!(averages.get(&[KeyValue::group("A")]), Some(15.0));
//!
//! let ranking =
//!     aggregator.rank_within_scale(&dataset, &ScaleKey::Numeric(1), "Makespan", SortOrder::Ascending)?;
//! assert_eq!(ranking.best().map(|e| e.group.as_str()), Some("B"));
//!
//! let rate = aggregator.improvement_rate(&dataset, "A", "B", "Makespan", None)?;
//! assert!((rate - 66.666_666).abs() < 1e-3);
//! # Ok(())
//! # }
//! ```

mod improvement;
mod rank;
mod stats;

pub use improvement::{BaselineEntry, BaselineTable, ImprovementSummary, ScaleImprovement};
pub use rank::{OverallRankEntry, RankEntry, Ranking, SortOrder};
pub use stats::{mean, sample_std_dev, Dispersion, GroupSummary};

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;

use crate::config::AggregatorConfig;
use crate::experiment::{Dataset, ExperimentRecord, ScaleKey};
use crate::{Error, Result};
use stats::{ensure_finite, Accumulator};

/// Categorical field a dataset can be partitioned by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupField {
    /// Experimental condition (algorithm).
    Group,
    /// Problem size.
    Scale,
    /// Repetition identifier.
    Seed,
}

/// One component of a partition key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyValue {
    /// Group key value.
    Group(String),
    /// Scale key value.
    Scale(ScaleKey),
    /// Seed value.
    Seed(u64),
}

impl KeyValue {
    /// Group key component.
    #[must_use]
    pub fn group(group: impl Into<String>) -> Self {
        Self::Group(group.into())
    }

    /// Scale key component.
    #[must_use]
    pub fn scale(scale: impl Into<ScaleKey>) -> Self {
        Self::Scale(scale.into())
    }

    fn of(record: &ExperimentRecord, field: GroupField) -> Self {
        match field {
            GroupField::Group => Self::Group(record.group_key().to_string()),
            GroupField::Scale => Self::Scale(record.scale_key().clone()),
            GroupField::Seed => Self::Seed(record.seed()),
        }
    }
}

/// Mean of one partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageEntry {
    /// Key values, one per requested field, in request order.
    pub key: Vec<KeyValue>,
    /// Arithmetic mean of the metric over the partition.
    pub mean: f64,
    /// Number of records in the partition.
    pub count: usize,
}

/// Result of [`ResultAggregator::average_by`].
///
/// Exactly one entry per key combination present in the data, in order of
/// first appearance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Averages {
    /// Fields the data was partitioned by.
    pub fields: Vec<GroupField>,
    /// Metric averaged.
    pub metric: String,
    /// One entry per partition.
    pub entries: Vec<AverageEntry>,
}

impl Averages {
    /// Look up a partition mean by its key values.
    #[must_use]
    pub fn get(&self, key: &[KeyValue]) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.key.as_slice() == key)
            .map(|e| e.mean)
    }

    /// Number of partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no partitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over partitions.
    pub fn iter(&self) -> impl Iterator<Item = &AverageEntry> {
        self.entries.iter()
    }
}

/// Scale × group matrix of means.
///
/// Rows follow sorted scale order, columns group discovery order. A cell is
/// `None` when the pair has no records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTab {
    /// Metric averaged.
    pub metric: String,
    /// Row labels.
    pub scales: Vec<ScaleKey>,
    /// Column labels.
    pub groups: Vec<String>,
    /// `cells[row][column]`.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl CrossTab {
    /// Mean for a `(scale, group)` pair.
    #[must_use]
    pub fn get(&self, scale: &ScaleKey, group: &str) -> Option<f64> {
        let row = self.scales.iter().position(|s| s == scale)?;
        let column = self.groups.iter().position(|g| g == group)?;
        self.cells.get(row)?.get(column).copied().flatten()
    }
}

/// Seed × group matrix of values at one scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedTable {
    /// Scale the table is restricted to.
    pub scale: ScaleKey,
    /// Metric tabulated.
    pub metric: String,
    /// Row labels, sorted.
    pub seeds: Vec<u64>,
    /// Column labels in discovery order.
    pub groups: Vec<String>,
    /// `cells[row][column]`; the mean if a seed was repeated.
    pub cells: Vec<Vec<Option<f64>>>,
}

/// Computes derived summary tables from a [`Dataset`].
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    config: AggregatorConfig,
}

impl ResultAggregator {
    /// Create an aggregator with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an aggregator with an explicit configuration.
    #[must_use]
    pub const fn with_config(config: AggregatorConfig) -> Self {
        Self { config }
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Mean of `metric` per distinct combination of `group_by` values.
    ///
    /// # Arguments
    /// * `dataset` - Source records
    /// * `group_by` - One or two distinct fields, e.g. `[Scale, Group]`
    /// * `metric` - Metric name present in every record
    ///
    /// # Errors
    /// - `InvalidInput` if `group_by` is empty, longer than 2, or repeats a field
    /// - `InvalidMetric` if any record lacks `metric`, or a mean overflows
    /// - `EmptyDataset` if the dataset has no records
    pub fn average_by(
        &self,
        dataset: &Dataset,
        group_by: &[GroupField],
        metric: &str,
    ) -> Result<Averages> {
        validate_fields(group_by)?;
        if dataset.is_empty() {
            return Err(Error::EmptyDataset);
        }

        let entries = partition_means(dataset.records().iter(), group_by, metric)?;
        debug!(metric, fields = ?group_by, partitions = entries.len(), "average_by");

        Ok(Averages {
            fields: group_by.to_vec(),
            metric: metric.to_string(),
            entries,
        })
    }

    /// Scale × group table of means for `metric`.
    ///
    /// # Errors
    /// Returns `InvalidMetric` if any record lacks `metric`.
    pub fn cross_tab(&self, dataset: &Dataset, metric: &str) -> Result<CrossTab> {
        let averages = self.average_by(dataset, &[GroupField::Scale, GroupField::Group], metric)?;

        let scales = dataset.scales().to_vec();
        let groups = dataset.groups().to_vec();
        let cells = scales
            .iter()
            .map(|scale| {
                groups
                    .iter()
                    .map(|group| {
                        averages.get(&[KeyValue::Scale(scale.clone()), KeyValue::group(group)])
                    })
                    .collect()
            })
            .collect();

        Ok(CrossTab {
            metric: metric.to_string(),
            scales,
            groups,
            cells,
        })
    }

    /// Seed × group table of `metric` at one scale.
    ///
    /// # Errors
    /// - `UnknownScale` if no record has `scale`
    /// - `InvalidMetric` if a record at `scale` lacks `metric`
    pub fn seed_table(&self, dataset: &Dataset, scale: &ScaleKey, metric: &str) -> Result<SeedTable> {
        if !dataset.contains_scale(scale) {
            return Err(Error::UnknownScale(scale.clone()));
        }

        let fields = [GroupField::Seed, GroupField::Group];
        let entries = partition_means(dataset.at_scale(scale), &fields, metric)?;

        let mut seeds: Vec<u64> = dataset.at_scale(scale).map(ExperimentRecord::seed).collect();
        seeds.sort_unstable();
        seeds.dedup();
        let groups: Vec<String> = dataset
            .groups()
            .iter()
            .filter(|g| dataset.at_scale(scale).any(|r| r.group_key() == g.as_str()))
            .cloned()
            .collect();

        let lookup: FxHashMap<&[KeyValue], f64> =
            entries.iter().map(|e| (e.key.as_slice(), e.mean)).collect();
        let cells = seeds
            .iter()
            .map(|seed| {
                groups
                    .iter()
                    .map(|group| {
                        let key = [KeyValue::Seed(*seed), KeyValue::group(group)];
                        lookup.get(key.as_slice()).copied()
                    })
                    .collect()
            })
            .collect();

        Ok(SeedTable {
            scale: scale.clone(),
            metric: metric.to_string(),
            seeds,
            groups,
            cells,
        })
    }
}

fn validate_fields(fields: &[GroupField]) -> Result<()> {
    match fields {
        [] => Err(Error::InvalidInput("group_by needs at least one field".to_string())),
        [_] => Ok(()),
        [a, b] if a == b => Err(Error::InvalidInput(format!(
            "group_by repeats field {a:?}"
        ))),
        [_, _] => Ok(()),
        _ => Err(Error::InvalidInput(format!(
            "group_by takes at most 2 fields, got {}",
            fields.len()
        ))),
    }
}

/// Partition `records` by `fields` and average `metric`, first-appearance order.
fn partition_means<'a>(
    records: impl Iterator<Item = &'a ExperimentRecord>,
    fields: &[GroupField],
    metric: &str,
) -> Result<Vec<AverageEntry>> {
    let mut index: FxHashMap<Vec<KeyValue>, usize> = FxHashMap::default();
    let mut partitions: Vec<(Vec<KeyValue>, Accumulator)> = Vec::new();

    for record in records {
        let value = record.require_metric(metric)?;
        let key: Vec<KeyValue> = fields.iter().map(|f| KeyValue::of(record, *f)).collect();
        let slot = if let Some(&slot) = index.get(&key) {
            slot
        } else {
            let slot = partitions.len();
            index.insert(key.clone(), slot);
            partitions.push((key, Accumulator::default()));
            slot
        };
        partitions[slot].1.push(value);
    }

    partitions
        .into_iter()
        .filter_map(|(key, acc)| Some((key, acc.mean()?, acc.count())))
        .map(|(key, mean, count)| {
            ensure_finite(metric, mean).map(|mean| AverageEntry { key, mean, count })
        })
        .collect()
}

/// Per-group mean of `metric` over `records`, sorted by group key.
///
/// Key order makes the result independent of the order rows were loaded in.
fn group_means<'a>(
    records: impl Iterator<Item = &'a ExperimentRecord>,
    metric: &str,
) -> Result<Vec<(&'a str, f64)>> {
    let mut groups: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for record in records {
        let value = record.require_metric(metric)?;
        groups.entry(record.group_key()).or_default().push(value);
    }

    groups
        .into_iter()
        .filter_map(|(group, acc)| Some((group, acc.mean()?)))
        .map(|(group, mean)| ensure_finite(metric, mean).map(|mean| (group, mean)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let rows = [
            ("CBO", 100, 42, 12.0),
            ("CBO", 100, 123, 14.0),
            ("GTO", 100, 42, 9.0),
            ("CBO", 500, 42, 40.0),
            ("GTO", 500, 42, 44.0),
            ("GTO", 500, 123, 46.0),
        ];
        Dataset::new(
            rows.iter()
                .map(|(g, s, seed, m)| {
                    ExperimentRecord::builder(*g, *s, *seed)
                        .metric("Makespan", *m)
                        .build()
                        .unwrap()
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_average_by_single_field() {
        let averages = ResultAggregator::new()
            .average_by(&dataset(), &[GroupField::Group], "Makespan")
            .unwrap();

        assert_eq!(averages.len(), 2);
        assert_eq!(averages.get(&[KeyValue::group("CBO")]), Some(22.0));
        assert_eq!(averages.get(&[KeyValue::group("GTO")]), Some(33.0));
    }

    #[test]
    fn test_average_by_scale_and_group() {
        let averages = ResultAggregator::new()
            .average_by(&dataset(), &[GroupField::Scale, GroupField::Group], "Makespan")
            .unwrap();

        assert_eq!(averages.len(), 4);
        let key = [KeyValue::scale(500), KeyValue::group("GTO")];
        assert_eq!(averages.get(&key), Some(45.0));
        assert_eq!(averages.entries[0].key, vec![KeyValue::scale(100), KeyValue::group("CBO")]);
        assert_eq!(averages.entries[0].count, 2);
    }

    #[test]
    fn test_average_by_rejects_bad_fields() {
        let aggregator = ResultAggregator::new();
        let data = dataset();
        assert!(matches!(
            aggregator.average_by(&data, &[], "Makespan"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            aggregator.average_by(&data, &[GroupField::Group, GroupField::Group], "Makespan"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            aggregator.average_by(
                &data,
                &[GroupField::Group, GroupField::Scale, GroupField::Seed],
                "Makespan"
            ),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_average_by_unknown_metric() {
        let err = ResultAggregator::new()
            .average_by(&dataset(), &[GroupField::Group], "Energy")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMetric { ref metric, .. } if metric == "Energy"));
    }

    #[test]
    fn test_cross_tab() {
        let table = ResultAggregator::new().cross_tab(&dataset(), "Makespan").unwrap();
        assert_eq!(table.scales, vec![ScaleKey::Numeric(100), ScaleKey::Numeric(500)]);
        assert_eq!(table.groups, vec!["CBO", "GTO"]);
        assert_eq!(table.get(&ScaleKey::Numeric(100), "CBO"), Some(13.0));
        assert_eq!(table.cells[1], vec![Some(40.0), Some(45.0)]);
    }

    #[test]
    fn test_cross_tab_get_short_rows() {
        let mut table = ResultAggregator::new().cross_tab(&dataset(), "Makespan").unwrap();
        table.cells.truncate(1);
        assert_eq!(table.get(&ScaleKey::Numeric(500), "GTO"), None);
        assert_eq!(table.get(&ScaleKey::Numeric(100), "GTO"), Some(9.0));

        table.cells[0].truncate(1);
        assert_eq!(table.get(&ScaleKey::Numeric(100), "GTO"), None);
        assert_eq!(table.get(&ScaleKey::Numeric(100), "CBO"), Some(13.0));
    }

    #[test]
    fn test_seed_table() {
        let table = ResultAggregator::new()
            .seed_table(&dataset(), &ScaleKey::Numeric(100), "Makespan")
            .unwrap();
        assert_eq!(table.seeds, vec![42, 123]);
        assert_eq!(table.groups, vec!["CBO", "GTO"]);
        assert_eq!(table.cells[0], vec![Some(12.0), Some(9.0)]);
        assert_eq!(table.cells[1], vec![Some(14.0), None]);
    }

    #[test]
    fn test_seed_table_unknown_scale() {
        assert!(matches!(
            ResultAggregator::new().seed_table(&dataset(), &ScaleKey::Numeric(7), "Makespan"),
            Err(Error::UnknownScale(ScaleKey::Numeric(7)))
        ));
    }

    #[test]
    fn test_group_means_sorted_by_key() {
        let data = dataset();
        let means = group_means(data.records().iter().rev(), "Makespan").unwrap();
        assert_eq!(means, vec![("CBO", 22.0), ("GTO", 33.0)]);
    }
}
