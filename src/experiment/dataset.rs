//! Dataset - immutable collection of experiment records
//!
//! A dataset is built once from loaded records and never mutated; every
//! derived table is recomputed from it on demand.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashSet;
use serde::Serialize;

use super::{ExperimentRecord, ScaleKey};
use crate::{Error, Result};

/// Immutable, non-empty collection of experiment records.
///
/// ## Ordering
///
/// Row order carries no meaning for any aggregate. Group keys are reported in
/// order of first discovery (for presentation and computation-order
/// tie-breaks); scale keys and seeds are reported sorted.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<ExperimentRecord>,
    groups: Vec<String>,
    scales: Vec<ScaleKey>,
}

/// Shape of a dataset: what was run, at which scales, with which seeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    /// Total number of records.
    pub record_count: usize,
    /// Group keys in discovery order.
    pub groups: Vec<String>,
    /// Scale keys, sorted.
    pub scales: Vec<ScaleKey>,
    /// Seeds, sorted.
    pub seeds: Vec<u64>,
}

impl Dataset {
    /// Create a dataset from records.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyDataset` if `records` is empty.
    pub fn new(records: Vec<ExperimentRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(Error::EmptyDataset);
        }

        let mut groups = Vec::new();
        let mut scales = BTreeSet::new();
        {
            let mut seen = FxHashSet::default();
            for record in &records {
                if seen.insert(record.group_key()) {
                    groups.push(record.group_key().to_string());
                }
                scales.insert(record.scale_key().clone());
            }
        }

        Ok(Self {
            records,
            groups,
            scales: scales.into_iter().collect(),
        })
    }

    /// Concatenate two datasets, e.g. a single-objective and a multi-objective
    /// result table to be compared as two groups.
    ///
    /// # Errors
    ///
    /// Never fails in practice since both inputs are non-empty; the `Result`
    /// mirrors [`Dataset::new`].
    pub fn merge(self, other: Self) -> Result<Self> {
        let mut records = self.records;
        records.extend(other.records);
        Self::new(records)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false: datasets are non-empty by construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in load order.
    #[must_use]
    pub fn records(&self) -> &[ExperimentRecord] {
        &self.records
    }

    /// Group keys in order of first discovery.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Distinct scale keys, sorted.
    #[must_use]
    pub fn scales(&self) -> &[ScaleKey] {
        &self.scales
    }

    /// Distinct seeds, sorted.
    #[must_use]
    pub fn seeds(&self) -> Vec<u64> {
        let seeds: BTreeSet<u64> = self.records.iter().map(ExperimentRecord::seed).collect();
        seeds.into_iter().collect()
    }

    /// Union of metric names across records, sorted.
    #[must_use]
    pub fn metric_names(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .records
            .iter()
            .flat_map(ExperimentRecord::metric_names)
            .collect();
        names.into_iter().map(str::to_string).collect()
    }

    /// Check whether a group key is present.
    #[must_use]
    pub fn contains_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// Check whether a scale key is present.
    #[must_use]
    pub fn contains_scale(&self, scale: &ScaleKey) -> bool {
        self.scales.binary_search(scale).is_ok()
    }

    /// Records at a given scale, in load order.
    pub fn at_scale<'a>(
        &'a self,
        scale: &'a ScaleKey,
    ) -> impl Iterator<Item = &'a ExperimentRecord> + 'a {
        self.records.iter().filter(move |r| r.scale_key() == scale)
    }

    /// Records of a given group, in load order.
    pub fn of_group<'a>(
        &'a self,
        group: &'a str,
    ) -> impl Iterator<Item = &'a ExperimentRecord> + 'a {
        self.records.iter().filter(move |r| r.group_key() == group)
    }

    /// Record counts per group, keyed by group.
    #[must_use]
    pub fn group_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.group_key()).or_default() += 1;
        }
        counts
    }

    /// Summarize the dataset shape.
    #[must_use]
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            record_count: self.records.len(),
            groups: self.groups.clone(),
            scales: self.scales.clone(),
            seeds: self.seeds(),
        }
    }
}
