//! Descriptive statistics: means, sample standard deviation, dispersion

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;

use super::ResultAggregator;
use crate::experiment::{Dataset, ScaleKey};
use crate::{Error, Result};

/// Running sum for a partition mean.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    pub(crate) fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub(crate) const fn count(&self) -> usize {
        self.count
    }

    /// Mean of the pushed values; `None` before the first push.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Reject a derived value that overflowed to infinity or NaN.
///
/// Inputs are finite, but sums of values near `f64::MAX` are not.
pub(crate) fn ensure_finite(metric: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::InvalidMetric {
            metric: metric.to_string(),
            reason: format!("aggregate overflowed to {value}"),
        })
    }
}

/// Arithmetic mean; `None` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); `None` below two values.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Mean and spread of one group at one scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    /// Scale key.
    pub scale: ScaleKey,
    /// Group key.
    pub group: String,
    /// Number of records in the pair.
    pub count: usize,
    /// Arithmetic mean of the metric.
    pub mean: f64,
    /// Sample standard deviation, absent for a single record.
    pub std_dev: Option<f64>,
}

/// Spread of one group's metric across all scales.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dispersion {
    /// Group key.
    pub group: String,
    /// Number of records.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation.
    pub std_dev: f64,
    /// `std_dev / mean * 100`.
    pub coefficient_of_variation: f64,
}

impl ResultAggregator {
    /// Per-group mean and standard deviation of `metric` at one scale.
    ///
    /// Groups appear in discovery order.
    ///
    /// # Errors
    ///
    /// - `UnknownScale` if no record has `scale`
    /// - `InvalidMetric` if a record at `scale` lacks `metric`, or a statistic overflows
    pub fn summarize(
        &self,
        dataset: &Dataset,
        scale: &ScaleKey,
        metric: &str,
    ) -> Result<Vec<GroupSummary>> {
        if !dataset.contains_scale(scale) {
            return Err(Error::UnknownScale(scale.clone()));
        }

        let mut index: FxHashMap<&str, usize> = FxHashMap::default();
        let mut groups: Vec<(&str, Vec<f64>)> = Vec::new();
        for record in dataset.at_scale(scale) {
            let value = record.require_metric(metric)?;
            let slot = *index.entry(record.group_key()).or_insert_with(|| {
                groups.push((record.group_key(), Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(value);
        }

        let mut summaries = Vec::with_capacity(groups.len());
        for (group, values) in groups {
            let Some(group_mean) = mean(&values) else {
                continue;
            };
            summaries.push(GroupSummary {
                scale: scale.clone(),
                group: group.to_string(),
                count: values.len(),
                mean: ensure_finite(metric, group_mean)?,
                std_dev: sample_std_dev(&values)
                    .map(|sd| ensure_finite(metric, sd))
                    .transpose()?,
            });
        }
        Ok(summaries)
    }

    /// Sample standard deviation and coefficient of variation of `metric`
    /// for every record of `group`, all scales combined.
    ///
    /// # Errors
    ///
    /// - `InsufficientSamples` if fewer than 2 records belong to `group`
    /// - `DivisionByZero` if the group mean is exactly zero
    /// - `InvalidMetric` if a record of `group` lacks `metric`, or a statistic overflows
    #[allow(clippy::float_cmp)]
    pub fn dispersion(&self, dataset: &Dataset, group: &str, metric: &str) -> Result<Dispersion> {
        let values = dataset
            .of_group(group)
            .map(|r| r.require_metric(metric))
            .collect::<Result<Vec<f64>>>()?;

        let (Some(mean), Some(std_dev)) = (mean(&values), sample_std_dev(&values)) else {
            return Err(Error::InsufficientSamples {
                group: group.to_string(),
                found: values.len(),
            });
        };

        let mean = ensure_finite(metric, mean)?;
        let std_dev = ensure_finite(metric, std_dev)?;
        if mean == 0.0 {
            return Err(Error::DivisionByZero {
                group: group.to_string(),
            });
        }

        debug!(group, metric, count = values.len(), mean, std_dev, "dispersion");

        Ok(Dispersion {
            group: group.to_string(),
            count: values.len(),
            mean,
            std_dev,
            coefficient_of_variation: ensure_finite(metric, std_dev / mean * 100.0)?,
        })
    }
}
