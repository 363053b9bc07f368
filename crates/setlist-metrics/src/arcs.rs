//! Player arcs: one narrative category per submitter.
//!
//! Classification compares a submitter against the rest of the league, so
//! the league-wide distributions of average points and consistency are
//! computed once into a [`LeagueContext`] and passed to every call.
//!
//! Rules are evaluated in order; the first match wins:
//!
//! 1. **Headliner**: average percentile ≥ 0.75 and consistency percentile < 0.5.
//! 2. **One-Hit Wonder**: peak round above twice the average.
//! 3. **Opening Act**: finishing strength below −0.3 × average.
//! 4. **Encore**: finishing strength above 0.3 × average.
//! 5. **Crowd Favorite**: consistency percentile < 0.25.
//! 6. **Wild Card**: consistency percentile ≥ 0.75.
//!
//! Anything else is a Crowd Favorite.

use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use setlist_core::constants::{
    ARC_FINISH_SWING, ARC_HEADLINER_AVG_PERCENTILE, ARC_HEADLINER_MAX_SPREAD_PERCENTILE,
    ARC_ONE_HIT_RATIO, ARC_STEADY_PERCENTILE, ARC_VOLATILE_PERCENTILE, DEFAULT_STRETCH_WINDOW,
};
use setlist_core::stats;
use setlist_core::{CompetitorId, Dataset};

use crate::submitters::submission_totals;
use crate::trends::{finishing_strength_of, peak_of, round_scores, stretch_of};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArcType {
    Headliner,
    #[serde(rename = "One-Hit Wonder")]
    OneHitWonder,
    #[serde(rename = "Opening Act")]
    OpeningAct,
    Encore,
    #[serde(rename = "Crowd Favorite")]
    CrowdFavorite,
    #[serde(rename = "Wild Card")]
    WildCard,
}

impl ArcType {
    pub const ALL: [ArcType; 6] = [
        ArcType::Headliner,
        ArcType::OneHitWonder,
        ArcType::OpeningAct,
        ArcType::Encore,
        ArcType::CrowdFavorite,
        ArcType::WildCard,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ArcType::Headliner => "Headliner",
            ArcType::OneHitWonder => "One-Hit Wonder",
            ArcType::OpeningAct => "Opening Act",
            ArcType::Encore => "Encore",
            ArcType::CrowdFavorite => "Crowd Favorite",
            ArcType::WildCard => "Wild Card",
        }
    }
}

impl fmt::Display for ArcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// League-wide distributions of average points and consistency (std dev
/// of per-submission totals) over every competitor with a submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeagueContext {
    averages: Vec<f64>,
    spreads: Vec<f64>,
}

impl LeagueContext {
    pub fn from_dataset(ds: &dyn Dataset) -> Self {
        let samples = ds.competitors().iter().filter_map(|c| {
            let totals = submission_totals(ds, &c.id, None);
            (!totals.is_empty()).then(|| stats::mean_std(&totals))
        });
        let ctx = Self::from_samples(samples);
        debug!(active = ctx.len(), "arcs: league context built");
        ctx
    }

    /// Build from `(average, std dev)` pairs.
    pub fn from_samples(samples: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let (averages, spreads) = samples.into_iter().unzip();
        Self { averages, spreads }
    }

    /// Number of active submitters.
    pub fn len(&self) -> usize {
        self.averages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.averages.is_empty()
    }

    /// Fraction of active submitters with a strictly lower average.
    pub fn avg_percentile(&self, avg_points: f64) -> f64 {
        stats::fraction_below(&self.averages, avg_points)
    }

    /// Fraction of active submitters with a strictly lower std dev.
    pub fn consistency_percentile(&self, consistency: f64) -> f64 {
        stats::fraction_below(&self.spreads, consistency)
    }
}

/// Everything the rule chain looks at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcSignals {
    pub avg_points: f64,
    pub avg_percentile: f64,
    pub consistency_percentile: f64,
    pub finishing_strength: f64,
    pub peak_points: u64,
}

fn is_headliner(s: &ArcSignals) -> bool {
    s.avg_percentile >= ARC_HEADLINER_AVG_PERCENTILE
        && s.consistency_percentile < ARC_HEADLINER_MAX_SPREAD_PERCENTILE
}

fn is_one_hit_wonder(s: &ArcSignals) -> bool {
    s.avg_points > 0.0 && s.peak_points as f64 > s.avg_points * ARC_ONE_HIT_RATIO
}

fn is_opening_act(s: &ArcSignals) -> bool {
    s.finishing_strength < -s.avg_points * ARC_FINISH_SWING
}

fn is_encore(s: &ArcSignals) -> bool {
    s.finishing_strength > s.avg_points * ARC_FINISH_SWING
}

fn is_crowd_favorite(s: &ArcSignals) -> bool {
    s.consistency_percentile < ARC_STEADY_PERCENTILE
}

fn is_wild_card(s: &ArcSignals) -> bool {
    s.consistency_percentile >= ARC_VOLATILE_PERCENTILE
}

/// The decision chain, highest priority first.
pub const ARC_RULES: [(ArcType, fn(&ArcSignals) -> bool); 6] = [
    (ArcType::Headliner, is_headliner),
    (ArcType::OneHitWonder, is_one_hit_wonder),
    (ArcType::OpeningAct, is_opening_act),
    (ArcType::Encore, is_encore),
    (ArcType::CrowdFavorite, is_crowd_favorite),
    (ArcType::WildCard, is_wild_card),
];

/// First matching rule in [`ARC_RULES`], or Crowd Favorite.
pub fn classify(signals: &ArcSignals) -> ArcType {
    ARC_RULES
        .iter()
        .find(|(_, rule)| rule(signals))
        .map(|&(arc, _)| arc)
        .unwrap_or(ArcType::CrowdFavorite)
}

/// A submitter's arc and the features that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcProfile {
    pub submitter_id: CompetitorId,
    pub name: String,
    pub arc: ArcType,
    pub avg_points: f64,
    pub consistency: f64,
    pub avg_percentile: f64,
    pub consistency_percentile: f64,
    pub finishing_strength: f64,
    /// 1-based league position of the peak round.
    pub peak_round: usize,
    pub peak_points: u64,
    /// 1-based league position where the best stretch starts.
    pub best_stretch_start: usize,
    pub best_stretch_avg: f64,
}

/// Arc profile of one submitter against a precomputed league context.
/// `None` if the submitter has no submissions.
pub fn player_arc(
    ds: &dyn Dataset,
    ctx: &LeagueContext,
    submitter: &CompetitorId,
    window: usize,
) -> Option<ArcProfile> {
    let totals = submission_totals(ds, submitter, None);
    if totals.is_empty() {
        return None;
    }
    let (avg_points, consistency) = stats::mean_std(&totals);
    let scores = round_scores(ds, submitter);
    let peak = peak_of(&scores);
    let stretch = stretch_of(&scores, window);

    let signals = ArcSignals {
        avg_points,
        avg_percentile: ctx.avg_percentile(avg_points),
        consistency_percentile: ctx.consistency_percentile(consistency),
        finishing_strength: finishing_strength_of(&scores),
        peak_points: peak.as_ref().map_or(0, |p| p.points),
    };

    Some(ArcProfile {
        submitter_id: submitter.clone(),
        name: ds.competitor_name(submitter).to_string(),
        arc: classify(&signals),
        avg_points,
        consistency,
        avg_percentile: signals.avg_percentile,
        consistency_percentile: signals.consistency_percentile,
        finishing_strength: signals.finishing_strength,
        peak_round: peak.as_ref().map_or(0, |p| p.round_num),
        peak_points: signals.peak_points,
        best_stretch_start: stretch.as_ref().map_or(0, |s| s.start_round),
        best_stretch_avg: stretch.as_ref().map_or(0.0, |s| s.avg_points),
    })
}

/// Arc category of one submitter. Builds the league context on every
/// call; prefer [`all_player_arcs`] or [`player_arc`] for many submitters.
pub fn player_arc_type(ds: &dyn Dataset, submitter: &CompetitorId) -> Option<ArcType> {
    let ctx = LeagueContext::from_dataset(ds);
    player_arc(ds, &ctx, submitter, DEFAULT_STRETCH_WINDOW).map(|p| p.arc)
}

/// Profiles for every active submitter, sorted by average points descending.
pub fn all_player_arcs(ds: &dyn Dataset, window: usize) -> Vec<ArcProfile> {
    let ctx = LeagueContext::from_dataset(ds);
    let mut arcs: Vec<ArcProfile> = ds
        .competitors()
        .iter()
        .filter_map(|c| player_arc(ds, &ctx, &c.id, window))
        .collect();
    arcs.sort_by_key(|a| std::cmp::Reverse(OrderedFloat(a.avg_points)));
    debug!(arcs = arcs.len(), "arcs: profiles computed");
    arcs
}
