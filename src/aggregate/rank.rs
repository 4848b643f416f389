//! Per-scale and overall rankings
//!
//! Rank 1 is best. Within a scale, groups with equal means still receive
//! distinct consecutive ranks in group-key order, so ranks never depend on
//! row order. The configured [`TieBreak`] orders groups with equal overall
//! mean rank.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{group_means, ResultAggregator};
use crate::config::{MissingScalePolicy, TieBreak};
use crate::experiment::{Dataset, ScaleKey};
use crate::{Error, Result};

/// Ranking direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Smallest mean ranks first (lower is better)
    #[default]
    Ascending,
    /// Largest mean ranks first (higher is better)
    Descending,
}

impl SortOrder {
    fn compare(self, a: f64, b: f64) -> Ordering {
        let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        match self {
            Self::Ascending => ord,
            Self::Descending => ord.reverse(),
        }
    }
}

/// One group's position at one scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    /// Group key.
    pub group: String,
    /// Mean metric at this scale.
    pub mean: f64,
    /// 1-based rank.
    pub rank: usize,
}

/// Ordering of all groups present at one scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    /// Scale ranked.
    pub scale: ScaleKey,
    /// Metric ranked by.
    pub metric: String,
    /// Direction used.
    pub order: SortOrder,
    /// Entries, best first.
    pub entries: Vec<RankEntry>,
}

impl Ranking {
    /// Rank of a group, if present at this scale.
    #[must_use]
    pub fn rank_of(&self, group: &str) -> Option<usize> {
        self.entries.iter().find(|e| e.group == group).map(|e| e.rank)
    }

    /// Rank-1 entry.
    #[must_use]
    pub fn best(&self) -> Option<&RankEntry> {
        self.entries.first()
    }

    /// The best `k` entries (all of them if `k` exceeds the group count).
    #[must_use]
    pub fn top(&self, k: usize) -> &[RankEntry] {
        &self.entries[..k.min(self.entries.len())]
    }

    /// Number of ranked groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no group is ranked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One group's standing across all scales.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallRankEntry {
    /// Group key.
    pub group: String,
    /// Mean of per-scale ranks, per the missing-scale policy.
    pub mean_rank: f64,
    /// Scales at which the group had records and was ranked.
    pub scales_ranked: usize,
    /// Scales at which the group ranked 1st.
    pub wins: usize,
}

impl ResultAggregator {
    /// Rank groups by mean `metric` at one scale.
    ///
    /// # Arguments
    /// * `scale` - Scale to restrict to
    /// * `order` - `Ascending` when lower metric is better
    ///
    /// # Returns
    /// One entry per group present at `scale`, ranks `1..=k`.
    ///
    /// # Errors
    /// - `UnknownScale` if no record has `scale`
    /// - `InvalidMetric` if a record at `scale` lacks `metric`
    pub fn rank_within_scale(
        &self,
        dataset: &Dataset,
        scale: &ScaleKey,
        metric: &str,
        order: SortOrder,
    ) -> Result<Ranking> {
        if !dataset.contains_scale(scale) {
            return Err(Error::UnknownScale(scale.clone()));
        }

        let mut means = group_means(dataset.at_scale(scale), metric)?;
        // Stable: equal means keep group-key order.
        means.sort_by(|a, b| order.compare(a.1, b.1));

        let entries: Vec<RankEntry> = means
            .into_iter()
            .enumerate()
            .map(|(i, (group, mean))| RankEntry {
                group: group.to_string(),
                mean,
                rank: i + 1,
            })
            .collect();

        debug!(%scale, metric, groups = entries.len(), "rank_within_scale");

        Ok(Ranking {
            scale: scale.clone(),
            metric: metric.to_string(),
            order,
            entries,
        })
    }

    /// Rankings for every scale, in sorted scale order, using the configured direction.
    ///
    /// # Errors
    /// Returns `InvalidMetric` if any record lacks `metric`.
    pub fn rank_all_scales(&self, dataset: &Dataset, metric: &str) -> Result<Vec<Ranking>> {
        dataset
            .scales()
            .iter()
            .map(|scale| self.rank_within_scale(dataset, scale, metric, self.config.order))
            .collect()
    }

    /// Overall ordering of groups by mean per-scale rank.
    ///
    /// Groups absent at a scale are handled per [`MissingScalePolicy`].
    ///
    /// # Errors
    /// - `InvalidMetric` if any record lacks `metric`
    /// - `UnknownGroup` under `MissingScalePolicy::Reject` when a group is absent at some scale
    #[allow(clippy::cast_precision_loss)]
    pub fn overall_rank(&self, dataset: &Dataset, metric: &str) -> Result<Vec<OverallRankEntry>> {
        let rankings = self.rank_all_scales(dataset, metric)?;
        let worst_rank = dataset.groups().len();

        let mut overall = Vec::with_capacity(dataset.groups().len());
        for group in dataset.groups() {
            let mut total = 0usize;
            let mut contributions = 0usize;
            let mut scales_ranked = 0usize;
            let mut wins = 0usize;
            let mut missing = Vec::new();

            for ranking in &rankings {
                if let Some(rank) = ranking.rank_of(group) {
                    total += rank;
                    contributions += 1;
                    scales_ranked += 1;
                    if rank == 1 {
                        wins += 1;
                    }
                    continue;
                }
                match self.config.missing_scale {
                    MissingScalePolicy::Exclude => missing.push(ranking.scale.clone()),
                    MissingScalePolicy::Penalize => {
                        total += worst_rank;
                        contributions += 1;
                    }
                    MissingScalePolicy::Reject => {
                        return Err(Error::UnknownGroup {
                            group: group.clone(),
                            scale: Some(ranking.scale.clone()),
                        });
                    }
                }
            }

            if !missing.is_empty() {
                warn!(group = %group, ?missing, "group absent at some scales, excluded from its mean rank");
            }

            // Every group is present at one scale at least, so contributions > 0.
            overall.push(OverallRankEntry {
                group: group.clone(),
                mean_rank: total as f64 / contributions as f64,
                scales_ranked,
                wins,
            });
        }

        if self.config.tie_break == TieBreak::Lexicographic {
            overall.sort_by(|a, b| a.group.cmp(&b.group));
        }
        overall.sort_by(|a, b| {
            a.mean_rank
                .partial_cmp(&b.mean_rank)
                .unwrap_or(Ordering::Equal)
        });

        Ok(overall)
    }
}
