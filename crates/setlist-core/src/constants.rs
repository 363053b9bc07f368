//! Engine constants. Point values are raw integers as assigned by voters;
//! popularity is the external 0–100 scale.

/// Upper bound of the external popularity scale.
pub const MAX_POPULARITY: u8 = 100;

/// Display name used for competitors and items that cannot be resolved.
pub const UNKNOWN_NAME: &str = "Unknown";

// ---------------------------------------------------------------------------
// Rank propagation (influence)
// ---------------------------------------------------------------------------

/// Probability of following an out-edge rather than teleporting.
pub const RANK_DAMPING: f64 = 0.85;

/// Convergence tolerance per node. Iteration stops once the L1 change
/// between sweeps drops below `node_count * RANK_TOLERANCE`.
pub const RANK_TOLERANCE: f64 = 1e-6;

/// Hard cap on power-iteration sweeps.
pub const RANK_MAX_ITERATIONS: usize = 100;

/// Hard cap on modularity local-move sweeps when grouping voting blocs.
pub const BLOC_MAX_PASSES: usize = 100;

// ---------------------------------------------------------------------------
// Voter metrics
// ---------------------------------------------------------------------------

/// Minimum points a vote must carry to count towards the hipster score.
pub const HIPSTER_MIN_POINTS: u32 = 2;

/// Minimum (item, score) pairs needed before a golden-ear correlation is reported.
pub const GOLDEN_EAR_MIN_PAIRS: usize = 3;

// ---------------------------------------------------------------------------
// Cross-round metrics
// ---------------------------------------------------------------------------

/// A finish at or above this rank counts towards a hot streak.
pub const DEFAULT_TOP_N: usize = 3;

/// Number of consecutive rounds in a best stretch.
pub const DEFAULT_STRETCH_WINDOW: usize = 3;

/// Momentum above this value reads as a rising trend, below its negation as falling.
pub const MOMENTUM_TREND_THRESHOLD: f64 = 0.1;

/// Average-points percentile at or above which a submitter may be a headliner.
pub const ARC_HEADLINER_AVG_PERCENTILE: f64 = 0.75;

/// Consistency percentile below which a headliner candidate qualifies.
pub const ARC_HEADLINER_MAX_SPREAD_PERCENTILE: f64 = 0.5;

/// Peak-to-average ratio above which a run reads as a one-hit wonder.
pub const ARC_ONE_HIT_RATIO: f64 = 2.0;

/// Fraction of the average that finishing strength must exceed to count
/// as a meaningful half-to-half swing.
pub const ARC_FINISH_SWING: f64 = 0.3;

/// Consistency percentile below which a submitter is a crowd favorite.
pub const ARC_STEADY_PERCENTILE: f64 = 0.25;

/// Consistency percentile at or above which a submitter is a wild card.
pub const ARC_VOLATILE_PERCENTILE: f64 = 0.75;

// ---------------------------------------------------------------------------
// Comment metrics
// ---------------------------------------------------------------------------

/// Minimum trimmed length for a comment to be considered notable.
pub const NOTABLE_MIN_LENGTH: usize = 50;

/// Number of notable comments returned by default.
pub const NOTABLE_TOP_N: usize = 20;

/// Minimum submissions required before a comment/points correlation is reported.
pub const COMMENT_CORRELATION_MIN_SAMPLES: usize = 3;
