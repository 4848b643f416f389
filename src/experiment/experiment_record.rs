//! Experiment Record - one observed row of an experiment result table

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Problem size or configuration label that partitions comparisons.
///
/// Task counts (`100`, `500`, ...) are numeric; anything else is kept as a
/// label. Numeric keys order before labels, numerically ascending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScaleKey {
    /// Integer scale such as a task count.
    Numeric(i64),
    /// Free-form scale label.
    Label(String),
}

impl ScaleKey {
    /// Parse a raw table cell: integers become `Numeric`, anything else `Label`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        trimmed
            .parse::<i64>()
            .map_or_else(|_| Self::Label(trimmed.to_string()), Self::Numeric)
    }
}

impl fmt::Display for ScaleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Label(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ScaleKey {
    fn from(value: i64) -> Self {
        Self::Numeric(value)
    }
}

impl From<i32> for ScaleKey {
    fn from(value: i32) -> Self {
        Self::Numeric(i64::from(value))
    }
}

impl From<u32> for ScaleKey {
    fn from(value: u32) -> Self {
        Self::Numeric(i64::from(value))
    }
}

impl From<&str> for ScaleKey {
    fn from(value: &str) -> Self {
        Self::Label(value.to_string())
    }
}

impl From<String> for ScaleKey {
    fn from(value: String) -> Self {
        Self::Label(value)
    }
}

/// Experiment Record represents a single trial of one algorithm at one scale.
///
/// Records are immutable once built. Metric values are always finite; the
/// builder rejects NaN and infinities so aggregation never has to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentRecord {
    group_key: String,
    scale_key: ScaleKey,
    seed: u64,
    metrics: BTreeMap<String, f64>,
}

impl ExperimentRecord {
    /// Create a builder for a record.
    ///
    /// # Arguments
    ///
    /// * `group_key` - Experimental condition, e.g. an algorithm name
    /// * `scale_key` - Problem size, e.g. a task count
    /// * `seed` - Repetition identifier
    #[must_use]
    pub fn builder(
        group_key: impl Into<String>,
        scale_key: impl Into<ScaleKey>,
        seed: u64,
    ) -> ExperimentRecordBuilder {
        ExperimentRecordBuilder::new(group_key, scale_key, seed)
    }

    /// Get the group key.
    #[must_use]
    pub fn group_key(&self) -> &str {
        &self.group_key
    }

    /// Get the scale key.
    #[must_use]
    pub const fn scale_key(&self) -> &ScaleKey {
        &self.scale_key
    }

    /// Get the seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Get a metric value by name.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    /// Get a metric value, failing with `InvalidMetric` when absent.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidMetric` if this record has no such metric.
    pub fn require_metric(&self, name: &str) -> Result<f64> {
        self.metric(name).ok_or_else(|| Error::InvalidMetric {
            metric: name.to_string(),
            reason: format!(
                "missing from record (group '{}', scale {}, seed {})",
                self.group_key, self.scale_key, self.seed
            ),
        })
    }

    /// Iterate over metric names in sorted order.
    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }
}

/// Builder for `ExperimentRecord`.
#[derive(Debug)]
pub struct ExperimentRecordBuilder {
    group_key: String,
    scale_key: ScaleKey,
    seed: u64,
    metrics: Vec<(String, f64)>,
}

impl ExperimentRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(group_key: impl Into<String>, scale_key: impl Into<ScaleKey>, seed: u64) -> Self {
        Self {
            group_key: group_key.into(),
            scale_key: scale_key.into(),
            seed,
            metrics: Vec::new(),
        }
    }

    /// Add a metric value. A later value for the same name replaces the earlier one.
    #[must_use]
    pub fn metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.push((name.into(), value));
        self
    }

    /// Build the `ExperimentRecord`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidMetric` if any metric value is NaN or infinite,
    /// and `Error::InvalidInput` if the group key is blank.
    pub fn build(self) -> Result<ExperimentRecord> {
        if self.group_key.trim().is_empty() {
            return Err(Error::InvalidInput("group key must not be empty".to_string()));
        }

        let mut metrics = BTreeMap::new();
        for (name, value) in self.metrics {
            if !value.is_finite() {
                return Err(Error::InvalidMetric {
                    metric: name,
                    reason: format!("non-numeric value {value}"),
                });
            }
            metrics.insert(name, value);
        }

        Ok(ExperimentRecord {
            group_key: self.group_key,
            scale_key: self.scale_key,
            seed: self.seed,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_key_parse() {
        assert_eq!(ScaleKey::parse("100"), ScaleKey::Numeric(100));
        assert_eq!(ScaleKey::parse(" 2000 "), ScaleKey::Numeric(2000));
        assert_eq!(ScaleKey::parse("large"), ScaleKey::Label("large".to_string()));
    }

    #[test]
    fn test_scale_key_ordering() {
        let mut keys = vec![
            ScaleKey::from("edge"),
            ScaleKey::from(1000),
            ScaleKey::from(50),
            ScaleKey::from("cloud"),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                ScaleKey::from(50),
                ScaleKey::from(1000),
                ScaleKey::from("cloud"),
                ScaleKey::from("edge"),
            ]
        );
    }

    #[test]
    fn test_record_builder() {
        let record = ExperimentRecord::builder("CBO", 100, 42)
            .metric("Makespan", 1.5e5)
            .metric("LoadBalanceRatio", 0.8)
            .build()
            .unwrap();

        assert_eq!(record.group_key(), "CBO");
        assert_eq!(record.scale_key(), &ScaleKey::Numeric(100));
        assert_eq!(record.seed(), 42);
        assert_eq!(record.metric("Makespan"), Some(1.5e5));
        assert_eq!(
            record.metric_names().collect::<Vec<_>>(),
            vec!["LoadBalanceRatio", "Makespan"]
        );
    }

    #[test]
    fn test_record_rejects_nan() {
        let err = ExperimentRecord::builder("CBO", 100, 42)
            .metric("Makespan", f64::NAN)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMetric { ref metric, .. } if metric == "Makespan"));
    }

    #[test]
    fn test_require_metric_missing() {
        let record = ExperimentRecord::builder("HHO", 100, 1).build().unwrap();
        assert!(matches!(
            record.require_metric("Makespan"),
            Err(Error::InvalidMetric { .. })
        ));
    }
}
