//! Aggregator configuration
//!
//! Ranking direction, tie-break and missing-scale handling are explicit
//! settings rather than incidental iteration order.
//!
//! ```rust
//! use metaheur_results::config::{AggregatorConfig, MissingScalePolicy, TieBreak};
//!
//! let config = AggregatorConfig::builder()
//!     .tie_break(TieBreak::Lexicographic)
//!     .missing_scale(MissingScalePolicy::Reject)
//!     .build();
//! assert_eq!(config.tie_break, TieBreak::Lexicographic);
//! ```

use serde::{Deserialize, Serialize};

use crate::aggregate::SortOrder;
use crate::Result;

/// How `overall_rank` orders groups with equal mean rank.
///
/// Ties within one scale are always broken by group key, so the mean ranks
/// themselves never depend on row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep group discovery order.
    #[default]
    ComputationOrder,
    /// Order tied groups by group key.
    Lexicographic,
}

/// What `overall_rank` does with a group that has no records at some scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingScalePolicy {
    /// Average only over the scales where the group is present.
    #[default]
    Exclude,
    /// Count the absent scale as the worst possible rank (number of groups).
    Penalize,
    /// Fail with `UnknownGroup`.
    Reject,
}

/// Aggregator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Ranking direction; `Ascending` means lower metric is better.
    pub order: SortOrder,
    /// Tie-break between equal overall mean ranks.
    pub tie_break: TieBreak,
    /// Handling of groups absent at some scales.
    pub missing_scale: MissingScalePolicy,
}

impl AggregatorConfig {
    /// Create a config builder starting from defaults.
    #[must_use]
    pub fn builder() -> AggregatorConfigBuilder {
        AggregatorConfigBuilder::default()
    }

    /// Parse a config from JSON. Omitted fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if the text is not a valid config object.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Builder for `AggregatorConfig`.
#[derive(Debug, Default)]
pub struct AggregatorConfigBuilder {
    config: AggregatorConfig,
}

impl AggregatorConfigBuilder {
    /// Set ranking direction.
    #[must_use]
    pub const fn order(mut self, order: SortOrder) -> Self {
        self.config.order = order;
        self
    }

    /// Set tie-break policy.
    #[must_use]
    pub const fn tie_break(mut self, tie_break: TieBreak) -> Self {
        self.config.tie_break = tie_break;
        self
    }

    /// Set missing-scale policy.
    #[must_use]
    pub const fn missing_scale(mut self, policy: MissingScalePolicy) -> Self {
        self.config.missing_scale = policy;
        self
    }

    /// Build the config.
    #[must_use]
    pub const fn build(self) -> AggregatorConfig {
        self.config
    }
}
