//! Tunable parameters for the metrics engine.
//!
//! [`MetricsConfig`] gathers every knob a caller may want to adjust; each
//! field falls back to the matching constant in
//! [`setlist_core::constants`] when omitted, so partial config files work.

use serde::{Deserialize, Serialize};

use setlist_core::constants::{
    DEFAULT_STRETCH_WINDOW, DEFAULT_TOP_N, NOTABLE_MIN_LENGTH, NOTABLE_TOP_N, RANK_DAMPING,
    RANK_MAX_ITERATIONS, RANK_TOLERANCE,
};

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// A finish at or above this rank counts towards a hot streak.
    pub top_n: usize,
    /// Consecutive rounds considered by best-stretch detection.
    pub stretch_window: usize,
    /// Rank-propagation damping factor.
    pub damping: f64,
    /// Rank-propagation per-node convergence tolerance.
    pub tolerance: f64,
    /// Rank-propagation iteration cap.
    pub max_iterations: usize,
    /// Minimum trimmed length of a notable comment.
    pub notable_min_length: usize,
    /// Number of notable comments reported.
    pub notable_top_n: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            stretch_window: DEFAULT_STRETCH_WINDOW,
            damping: RANK_DAMPING,
            tolerance: RANK_TOLERANCE,
            max_iterations: RANK_MAX_ITERATIONS,
            notable_min_length: NOTABLE_MIN_LENGTH,
            notable_top_n: NOTABLE_TOP_N,
        }
    }
}

impl MetricsConfig {
    /// The rank-propagation subset of this config.
    pub fn rank_config(&self) -> RankConfig {
        RankConfig {
            damping: self.damping,
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
        }
    }
}

/// Parameters of the influence power iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankConfig {
    pub damping: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            damping: RANK_DAMPING,
            tolerance: RANK_TOLERANCE,
            max_iterations: RANK_MAX_ITERATIONS,
        }
    }
}

impl RankConfig {
    /// Damping in `[0, 1)`, a positive finite tolerance and at least one iteration.
    pub fn is_valid(&self) -> bool {
        (0.0..1.0).contains(&self.damping)
            && self.tolerance.is_finite()
            && self.tolerance > 0.0
            && self.max_iterations > 0
    }
}
