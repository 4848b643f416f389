//! Relative improvement of a candidate group over a baseline group

use serde::Serialize;
use tracing::debug;

use super::stats::{ensure_finite, Accumulator};
use super::ResultAggregator;
use crate::experiment::{Dataset, ScaleKey};
use crate::{Error, Result};

/// Improvement at one scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleImprovement {
    /// Scale key.
    pub scale: ScaleKey,
    /// Baseline mean at this scale.
    pub baseline_mean: f64,
    /// Candidate mean at this scale.
    pub candidate_mean: f64,
    /// `(baseline - candidate) / baseline * 100`.
    pub rate: f64,
}

/// Improvement of a candidate over a baseline, per scale and overall.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImprovementSummary {
    /// Metric compared.
    pub metric: String,
    /// Baseline group key.
    pub baseline: String,
    /// Candidate group key.
    pub candidate: String,
    /// One entry per scale, sorted by scale.
    pub per_scale: Vec<ScaleImprovement>,
    /// Rate from the means over all records of each group.
    pub pooled: f64,
    /// Rate from the average of the per-scale means of each group.
    pub mean_of_scale_means: f64,
}

/// One group at one scale, ranked and compared against a fixed baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineEntry {
    /// Group key.
    pub group: String,
    /// Mean metric at the scale.
    pub mean: f64,
    /// 1-based rank at the scale.
    pub rank: usize,
    /// Improvement over the baseline mean; `0.0` for the baseline itself.
    pub rate: f64,
}

/// Every group at one scale against a single baseline group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineTable {
    /// Scale compared at.
    pub scale: ScaleKey,
    /// Metric compared.
    pub metric: String,
    /// Baseline group key.
    pub baseline: String,
    /// Baseline mean at the scale.
    pub baseline_mean: f64,
    /// Entries, best rank first.
    pub entries: Vec<BaselineEntry>,
}

impl ResultAggregator {
    /// Rank every group at `scale` and give each one's improvement over `baseline`.
    ///
    /// Ranking uses the configured direction.
    ///
    /// # Errors
    /// - `UnknownScale` if no record has `scale`
    /// - `UnknownGroup` if `baseline` has no records at `scale`
    /// - `DivisionByZero` if the baseline mean is exactly zero and another group is present
    /// - `InvalidMetric` if a record at `scale` lacks `metric`
    pub fn improvement_vs_baseline(
        &self,
        dataset: &Dataset,
        baseline: &str,
        metric: &str,
        scale: &ScaleKey,
    ) -> Result<BaselineTable> {
        let ranking = self.rank_within_scale(dataset, scale, metric, self.config.order)?;
        let baseline_mean = ranking
            .entries
            .iter()
            .find(|e| e.group == baseline)
            .map(|e| e.mean)
            .ok_or_else(|| Error::UnknownGroup {
                group: baseline.to_string(),
                scale: Some(scale.clone()),
            })?;

        let entries = ranking
            .entries
            .into_iter()
            .map(|e| {
                let rate = if e.group == baseline {
                    Ok(0.0)
                } else {
                    relative_improvement(metric, baseline, baseline_mean, e.mean)
                };
                rate.map(|rate| BaselineEntry {
                    group: e.group,
                    mean: e.mean,
                    rank: e.rank,
                    rate,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(baseline, metric, %scale, groups = entries.len(), "improvement_vs_baseline");

        Ok(BaselineTable {
            scale: scale.clone(),
            metric: metric.to_string(),
            baseline: baseline.to_string(),
            baseline_mean,
            entries,
        })
    }

    /// Percentage by which `candidate` reduces mean `metric` relative to `baseline`.
    ///
    /// Positive means the candidate is better (lower). With `scale` set, only
    /// records at that scale are considered; otherwise all records are pooled.
    ///
    /// # Errors
    /// - `InvalidInput` if `baseline` and `candidate` are the same group
    /// - `UnknownGroup` if either group has no records in scope
    /// - `DivisionByZero` if the baseline mean is exactly zero
    /// - `InvalidMetric` if a record in scope lacks `metric`, or a mean overflows
    pub fn improvement_rate(
        &self,
        dataset: &Dataset,
        baseline: &str,
        candidate: &str,
        metric: &str,
        scale: Option<&ScaleKey>,
    ) -> Result<f64> {
        if baseline == candidate {
            return Err(Error::InvalidInput(format!(
                "baseline and candidate must differ, both are '{baseline}'"
            )));
        }

        let baseline_mean = scoped_mean(dataset, baseline, metric, scale)?;
        let candidate_mean = scoped_mean(dataset, candidate, metric, scale)?;
        let rate = relative_improvement(metric, baseline, baseline_mean, candidate_mean)?;

        debug!(baseline, candidate, metric, ?scale, baseline_mean, candidate_mean, rate, "improvement_rate");
        Ok(rate)
    }

    /// Improvement of `candidate` over `baseline` at every scale, plus the
    /// pooled rate and the rate over averaged per-scale means.
    ///
    /// # Errors
    /// Same as [`improvement_rate`](Self::improvement_rate); every scale must
    /// contain both groups.
    #[allow(clippy::cast_precision_loss)]
    pub fn improvement_by_scale(
        &self,
        dataset: &Dataset,
        baseline: &str,
        candidate: &str,
        metric: &str,
    ) -> Result<ImprovementSummary> {
        let pooled = self.improvement_rate(dataset, baseline, candidate, metric, None)?;

        let mut per_scale = Vec::with_capacity(dataset.scales().len());
        for scale in dataset.scales() {
            let baseline_mean = scoped_mean(dataset, baseline, metric, Some(scale))?;
            let candidate_mean = scoped_mean(dataset, candidate, metric, Some(scale))?;
            per_scale.push(ScaleImprovement {
                scale: scale.clone(),
                baseline_mean,
                candidate_mean,
                rate: relative_improvement(metric, baseline, baseline_mean, candidate_mean)?,
            });
        }

        let count = per_scale.len() as f64;
        let avg_baseline =
            ensure_finite(metric, per_scale.iter().map(|s| s.baseline_mean).sum::<f64>() / count)?;
        let avg_candidate =
            ensure_finite(metric, per_scale.iter().map(|s| s.candidate_mean).sum::<f64>() / count)?;

        Ok(ImprovementSummary {
            metric: metric.to_string(),
            baseline: baseline.to_string(),
            candidate: candidate.to_string(),
            per_scale,
            pooled,
            mean_of_scale_means: relative_improvement(metric, baseline, avg_baseline, avg_candidate)?,
        })
    }
}

/// Mean of `metric` for one group, optionally restricted to one scale.
fn scoped_mean(
    dataset: &Dataset,
    group: &str,
    metric: &str,
    scale: Option<&ScaleKey>,
) -> Result<f64> {
    let mut acc = Accumulator::default();
    for record in dataset
        .of_group(group)
        .filter(|r| scale.map_or(true, |s| r.scale_key() == s))
    {
        acc.push(record.require_metric(metric)?);
    }

    let mean = acc.mean().ok_or_else(|| Error::UnknownGroup {
        group: group.to_string(),
        scale: scale.cloned(),
    })?;
    ensure_finite(metric, mean)
}

#[allow(clippy::float_cmp)]
fn relative_improvement(
    metric: &str,
    baseline: &str,
    baseline_mean: f64,
    candidate_mean: f64,
) -> Result<f64> {
    if baseline_mean == 0.0 {
        return Err(Error::DivisionByZero {
            group: baseline.to_string(),
        });
    }
    ensure_finite(metric, (baseline_mean - candidate_mean) / baseline_mean * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::ExperimentRecord;

    fn dataset(rows: &[(&str, i64, f64)]) -> Dataset {
        Dataset::new(
            rows.iter()
                .enumerate()
                .map(|(i, (g, s, m))| {
                    ExperimentRecord::builder(*g, *s, i as u64)
                        .metric("Makespan", *m)
                        .build()
                        .unwrap()
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_improvement_rate_basic() {
        let data = dataset(&[("A", 1, 10.0), ("A", 1, 20.0), ("B", 1, 5.0), ("B", 1, 5.0)]);
        let rate = ResultAggregator::new()
            .improvement_rate(&data, "A", "B", "Makespan", None)
            .unwrap();
        assert!((rate - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_improvement_rate_negative_when_worse() {
        let data = dataset(&[("A", 1, 10.0), ("B", 1, 12.0)]);
        let rate = ResultAggregator::new()
            .improvement_rate(&data, "A", "B", "Makespan", None)
            .unwrap();
        assert!((rate + 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_improvement_rate_zero_baseline() {
        let data = dataset(&[("A", 1, 0.0), ("A", 1, 0.0), ("B", 1, 5.0)]);
        let err = ResultAggregator::new()
            .improvement_rate(&data, "A", "B", "Makespan", None)
            .unwrap_err();
        assert!(matches!(err, Error::DivisionByZero { ref group } if group == "A"));
    }

    #[test]
    fn test_improvement_rate_scale_restricted_unknown_group() {
        let data = dataset(&[("A", 1, 10.0), ("B", 1, 5.0), ("A", 2, 10.0)]);
        let err = ResultAggregator::new()
            .improvement_rate(&data, "A", "B", "Makespan", Some(&ScaleKey::Numeric(2)))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownGroup { ref group, scale: Some(ScaleKey::Numeric(2)) } if group == "B"
        ));
    }

    #[test]
    fn test_improvement_rate_same_group() {
        let data = dataset(&[("A", 1, 10.0)]);
        assert!(matches!(
            ResultAggregator::new().improvement_rate(&data, "A", "A", "Makespan", None),
            Err(Error::InvalidInput(_))
        ));
    }

    fn five_algorithms() -> Dataset {
        dataset(&[
            ("CBO", 100, 150.0),
            ("LSCBO-Fixed", 100, 90.0),
            ("HHO", 100, 120.0),
            ("AOA", 100, 160.0),
            ("GTO", 100, 130.0),
            ("CBO", 500, 600.0),
        ])
    }

    #[test]
    fn test_improvement_vs_baseline_all_groups() {
        let table = ResultAggregator::new()
            .improvement_vs_baseline(&five_algorithms(), "CBO", "Makespan", &ScaleKey::Numeric(100))
            .unwrap();

        let groups: Vec<&str> = table.entries.iter().map(|e| e.group.as_str()).collect();
        assert_eq!(groups, vec!["LSCBO-Fixed", "HHO", "GTO", "CBO", "AOA"]);
        assert!((table.baseline_mean - 150.0).abs() < f64::EPSILON);

        let rate = |group: &str| table.entries.iter().find(|e| e.group == group).unwrap().rate;
        assert!((rate("LSCBO-Fixed") - 40.0).abs() < 1e-9);
        assert!((rate("HHO") - 20.0).abs() < 1e-9);
        assert!((rate("GTO") - 40.0 / 3.0).abs() < 1e-9);
        assert!((rate("AOA") + 20.0 / 3.0).abs() < 1e-9);
        assert!(rate("CBO").abs() < f64::EPSILON);
        assert_eq!(table.entries[3].rank, 4);
    }

    #[test]
    fn test_improvement_vs_baseline_missing_baseline() {
        let data = dataset(&[("HHO", 100, 120.0), ("CBO", 500, 600.0)]);
        let err = ResultAggregator::new()
            .improvement_vs_baseline(&data, "CBO", "Makespan", &ScaleKey::Numeric(100))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownGroup { ref group, scale: Some(ScaleKey::Numeric(100)) } if group == "CBO"
        ));
    }

    #[test]
    fn test_improvement_vs_baseline_unknown_scale() {
        let err = ResultAggregator::new()
            .improvement_vs_baseline(&five_algorithms(), "CBO", "Makespan", &ScaleKey::Numeric(7))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownScale(ScaleKey::Numeric(7))));
    }

    #[test]
    fn test_improvement_by_scale() {
        let data = dataset(&[
            ("Single", 100, 100.0),
            ("Multi", 100, 90.0),
            ("Single", 500, 300.0),
            ("Multi", 500, 330.0),
        ]);
        let summary = ResultAggregator::new()
            .improvement_by_scale(&data, "Single", "Multi", "Makespan")
            .unwrap();

        assert_eq!(summary.per_scale.len(), 2);
        assert!((summary.per_scale[0].rate - 10.0).abs() < 1e-9);
        assert!((summary.per_scale[1].rate + 10.0).abs() < 1e-9);
        // averages: 200 vs 210
        assert!((summary.mean_of_scale_means + 5.0).abs() < 1e-9);
        assert!((summary.pooled + 5.0).abs() < 1e-9);
    }
}
