//! Comparison report: the full set of derived tables for one results file
//!
//! A report bundles what a results analysis needs (averages per scale,
//! per-scale and overall rankings, improvement over a baseline and
//! per-group dispersion) as plain serializable values. Turning it into
//! console text, LaTeX or charts is left to the consumer.
//!
//! ```rust
//! use metaheur_results::aggregate::ResultAggregator;
//! use metaheur_results::loader::{load_csv_reader, CsvSchema};
//! use metaheur_results::report::{ComparisonReport, ReportRequest};
//!
//! let csv = "Algorithm,TaskCount,Seed,Makespan\n\
//!            CBO,100,42,120\nCBO,100,123,130\n\
//!            LSCBO-Fixed,100,42,80\nLSCBO-Fixed,100,123,90\n";
//! let dataset = load_csv_reader(csv.as_bytes(), &CsvSchema::five_algorithm())?;
//!
//! let request = ReportRequest::new("Makespan").compare("CBO", "LSCBO-Fixed");
//! let report = ComparisonReport::build(&ResultAggregator::new(), &dataset, &request)?;
//! assert_eq!(report.best_group.as_deref(), Some("LSCBO-Fixed"));
//! # Ok::<(), metaheur_results::Error>(())
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{
    BaselineTable, CrossTab, Dispersion, ImprovementSummary, OverallRankEntry, Ranking,
    ResultAggregator,
};
use crate::experiment::{Dataset, DatasetSummary};
use crate::{Error, Result};

/// What a report should contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Metric used for rankings, improvement and dispersion.
    pub primary_metric: String,
    /// Extra metrics to tabulate per scale (e.g. load balance, run time).
    #[serde(default)]
    pub secondary_metrics: Vec<String>,
    /// Baseline group: every group is compared against it at each scale.
    #[serde(default)]
    pub baseline: Option<String>,
    /// Candidate group for the pairwise improvement section; needs `baseline`.
    #[serde(default)]
    pub candidate: Option<String>,
}

impl ReportRequest {
    /// Request a report on `primary_metric` only.
    #[must_use]
    pub fn new(primary_metric: impl Into<String>) -> Self {
        Self {
            primary_metric: primary_metric.into(),
            secondary_metrics: Vec::new(),
            baseline: None,
            candidate: None,
        }
    }

    /// Also tabulate `metric` per scale.
    #[must_use]
    pub fn secondary(mut self, metric: impl Into<String>) -> Self {
        self.secondary_metrics.push(metric.into());
        self
    }

    /// Compare every group against `baseline` at each scale.
    #[must_use]
    pub fn against(mut self, baseline: impl Into<String>) -> Self {
        self.baseline = Some(baseline.into());
        self
    }

    /// Include the improvement of `candidate` over `baseline`.
    #[must_use]
    pub fn compare(mut self, baseline: impl Into<String>, candidate: impl Into<String>) -> Self {
        self.baseline = Some(baseline.into());
        self.candidate = Some(candidate.into());
        self
    }
}

/// Dispersion of one group, absent when it cannot be computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDispersion {
    /// Group key.
    pub group: String,
    /// `None` when the group has fewer than 2 records or a zero mean.
    pub dispersion: Option<Dispersion>,
}

/// Derived tables for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    /// Dataset shape.
    pub summary: DatasetSummary,
    /// Scale × group means, primary metric first.
    pub cross_tabs: Vec<CrossTab>,
    /// Per-scale rankings on the primary metric.
    pub rankings: Vec<Ranking>,
    /// Overall ranking on the primary metric.
    pub overall: Vec<OverallRankEntry>,
    /// Group with the best overall mean rank.
    pub best_group: Option<String>,
    /// Every group against the baseline, one table per scale, when a baseline is set.
    pub baseline_tables: Vec<BaselineTable>,
    /// Candidate vs baseline, when both are set.
    pub improvement: Option<ImprovementSummary>,
    /// Dispersion of the primary metric per group, in discovery order.
    pub dispersion: Vec<GroupDispersion>,
}

impl ComparisonReport {
    /// Compute every section of the report.
    ///
    /// Fails on the first error, except that a group whose dispersion is
    /// undefined (one record, zero mean) gets an empty dispersion entry.
    ///
    /// # Errors
    /// - `InvalidInput` if a candidate is set without a baseline
    /// - any other error of the underlying aggregator operations
    pub fn build(
        aggregator: &ResultAggregator,
        dataset: &Dataset,
        request: &ReportRequest,
    ) -> Result<Self> {
        let metric = request.primary_metric.as_str();

        let cross_tabs = std::iter::once(metric)
            .chain(request.secondary_metrics.iter().map(String::as_str))
            .map(|m| aggregator.cross_tab(dataset, m))
            .collect::<Result<Vec<_>>>()?;

        let rankings = aggregator.rank_all_scales(dataset, metric)?;
        let overall = aggregator.overall_rank(dataset, metric)?;

        let baseline_tables = match &request.baseline {
            Some(baseline) => dataset
                .scales()
                .iter()
                .map(|scale| aggregator.improvement_vs_baseline(dataset, baseline, metric, scale))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        let improvement = match (&request.baseline, &request.candidate) {
            (Some(baseline), Some(candidate)) => {
                Some(aggregator.improvement_by_scale(dataset, baseline, candidate, metric)?)
            }
            (_, None) => None,
            (None, Some(_)) => {
                return Err(Error::InvalidInput(
                    "candidate requires a baseline".to_string(),
                ))
            }
        };

        let mut dispersion = Vec::with_capacity(dataset.groups().len());
        for group in dataset.groups() {
            let entry = match aggregator.dispersion(dataset, group, metric) {
                Ok(d) => Some(d),
                Err(err @ (Error::InsufficientSamples { .. } | Error::DivisionByZero { .. })) => {
                    debug!(group = %group, %err, "dispersion undefined, left empty");
                    None
                }
                Err(err) => return Err(err),
            };
            dispersion.push(GroupDispersion {
                group: group.clone(),
                dispersion: entry,
            });
        }

        debug!(
            metric,
            scales = rankings.len(),
            groups = overall.len(),
            "built comparison report"
        );

        Ok(Self {
            summary: dataset.summary(),
            cross_tabs,
            rankings,
            best_group: overall.first().map(|e| e.group.clone()),
            overall,
            baseline_tables,
            improvement,
            dispersion,
        })
    }

    /// Scales at which `group` ranked 1st.
    #[must_use]
    pub fn wins_of(&self, group: &str) -> Vec<&Ranking> {
        self.rankings
            .iter()
            .filter(|r| r.best().is_some_and(|e| e.group == group))
            .collect()
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    /// Returns `Error::Json` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
