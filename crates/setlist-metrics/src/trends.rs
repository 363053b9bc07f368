//! Cross-round metrics.
//!
//! Everything here walks the league's rounds in competition order:
//! per-round rankings, cumulative points, momentum, hot streaks, finishing
//! strength, peak round and best stretch, plus per-round trajectories and
//! round competitiveness.

use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use setlist_core::constants::MOMENTUM_TREND_THRESHOLD;
use setlist_core::stats;
use setlist_core::{CompetitorId, Dataset, ItemId, RoundId};

use crate::songs::total_points;
use crate::submitters::average_points_per_submission;
use crate::voters::generosity_score;

// ---------------------------------------------------------------------------
// Rankings
// ---------------------------------------------------------------------------

/// One placement in one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRanking {
    pub round_id: RoundId,
    /// Zero-based position of the round in the league.
    pub round_index: usize,
    pub submitter_id: CompetitorId,
    pub submitter_name: String,
    pub item_id: ItemId,
    pub song: String,
    pub artist: String,
    pub points: u64,
    /// 1-based position within the round.
    pub rank: usize,
}

/// Placements for every round, in round order.
///
/// Within a round submissions are sorted by points descending; ties keep
/// submission order and still receive distinct consecutive ranks.
pub fn round_rankings(ds: &dyn Dataset) -> Vec<RoundRanking> {
    let mut rankings = Vec::new();
    for (round_index, round) in ds.rounds().iter().enumerate() {
        let mut placed: Vec<RoundRanking> = ds
            .submissions()
            .iter()
            .filter(|s| &s.round_id == round)
            .map(|s| {
                let info = ds.track_info(&s.item_id);
                RoundRanking {
                    round_id: round.clone(),
                    round_index,
                    submitter_id: s.submitter_id.clone(),
                    submitter_name: ds.competitor_name(&s.submitter_id).to_string(),
                    item_id: s.item_id.clone(),
                    song: info.name,
                    artist: info.artist,
                    points: total_points(ds, &s.item_id, Some(round)),
                    rank: 0,
                }
            })
            .collect();
        placed.sort_by(|a, b| b.points.cmp(&a.points));
        for (i, r) in placed.iter_mut().enumerate() {
            r.rank = i + 1;
        }
        rankings.extend(placed);
    }
    debug!(rounds = ds.rounds().len(), rows = rankings.len(), "trends: round rankings built");
    rankings
}

// ---------------------------------------------------------------------------
// Round series
// ---------------------------------------------------------------------------

/// A submitter's result in one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundScore {
    pub round_index: usize,
    pub round_id: RoundId,
    pub points: u64,
}

fn round_total(ds: &dyn Dataset, submitter: &CompetitorId, round: &RoundId) -> Option<u64> {
    let subs = ds.submissions_by(submitter, Some(round));
    if subs.is_empty() {
        return None;
    }
    Some(subs.iter().map(|s| total_points(ds, &s.item_id, Some(round))).sum())
}

/// `(round index, round id, points)` for each round the submitter entered.
pub fn round_scores(ds: &dyn Dataset, submitter: &CompetitorId) -> Vec<RoundScore> {
    ds.rounds()
        .iter()
        .enumerate()
        .filter_map(|(round_index, round)| {
            round_total(ds, submitter, round).map(|points| RoundScore {
                round_index,
                round_id: round.clone(),
                points,
            })
        })
        .collect()
}

/// Running total of points after each round. Rounds without a submission
/// add nothing but still appear.
pub fn cumulative_points_by_round(ds: &dyn Dataset, submitter: &CompetitorId) -> Vec<(RoundId, u64)> {
    let mut running = 0;
    ds.rounds()
        .iter()
        .map(|round| {
            running += round_total(ds, submitter, round).unwrap_or(0);
            (round.clone(), running)
        })
        .collect()
}

/// Average points per submission in each of the given rounds.
pub fn submitter_performance_trajectory(
    ds: &dyn Dataset,
    submitter: &CompetitorId,
    rounds: &[RoundId],
) -> Vec<(RoundId, f64)> {
    rounds
        .iter()
        .map(|r| (r.clone(), average_points_per_submission(ds, submitter, Some(r))))
        .collect()
}

/// Generosity `(mean, std dev)` in each of the given rounds.
pub fn voter_consistency_across_rounds(
    ds: &dyn Dataset,
    voter: &CompetitorId,
    rounds: &[RoundId],
) -> Vec<(RoundId, (f64, f64))> {
    rounds
        .iter()
        .map(|r| (r.clone(), generosity_score(ds, voter, Some(r))))
        .collect()
}

/// Spread of votes and song scores within one round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundCompetitiveness {
    /// Population variance of nonzero vote values.
    pub vote_variance: f64,
    pub vote_std: f64,
    /// Population variance of per-item totals.
    pub score_variance: f64,
    pub score_std: f64,
    pub avg_score: f64,
}

pub fn round_competitiveness(ds: &dyn Dataset, round: &RoundId) -> RoundCompetitiveness {
    let votes: Vec<u32> = ds
        .votes()
        .iter()
        .filter(|v| &v.round_id == round && v.is_cast())
        .map(|v| v.points)
        .collect();

    let mut items: Vec<&ItemId> = Vec::new();
    for s in ds.submissions().iter().filter(|s| &s.round_id == round) {
        if !items.contains(&&s.item_id) {
            items.push(&s.item_id);
        }
    }
    let scores: Vec<u64> = items
        .into_iter()
        .map(|item| total_points(ds, item, Some(round)))
        .collect();

    RoundCompetitiveness {
        vote_variance: stats::variance(&votes),
        vote_std: stats::std_dev(&votes),
        score_variance: stats::variance(&scores),
        score_std: stats::std_dev(&scores),
        avg_score: stats::mean(&scores),
    }
}

// ---------------------------------------------------------------------------
// Momentum
// ---------------------------------------------------------------------------

/// Slope of the submitter's min-max normalized round totals against round
/// index: sample covariance over population variance of the indices.
///
/// `0.0` with fewer than two rounds entered or a flat series.
pub fn momentum_score(ds: &dyn Dataset, submitter: &CompetitorId) -> f64 {
    momentum_of(&round_scores(ds, submitter))
}

pub(crate) fn momentum_of(scores: &[RoundScore]) -> f64 {
    if scores.len() < 2 {
        return 0.0;
    }
    let xs: Vec<f64> = scores.iter().map(|s| s.round_index as f64).collect();
    let ys: Vec<u64> = scores.iter().map(|s| s.points).collect();
    let (Some(&lo), Some(&hi)) = (ys.iter().min(), ys.iter().max()) else {
        return 0.0;
    };
    if hi == lo {
        return 0.0;
    }
    let range = (hi - lo) as f64;
    let normalized: Vec<f64> = ys.iter().map(|&y| (y - lo) as f64 / range).collect();

    let var_x = stats::variance(&xs);
    if var_x == 0.0 {
        return 0.0;
    }
    stats::finite_or_zero(stats::sample_covariance(&xs, &normalized) / var_x)
}

/// Direction read off a momentum score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MomentumTrend {
    Rising,
    Steady,
    Falling,
}

impl fmt::Display for MomentumTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MomentumTrend::Rising => "Rising",
            MomentumTrend::Steady => "Steady",
            MomentumTrend::Falling => "Falling",
        })
    }
}

pub fn momentum_trend(momentum: f64) -> MomentumTrend {
    if momentum > MOMENTUM_TREND_THRESHOLD {
        MomentumTrend::Rising
    } else if momentum < -MOMENTUM_TREND_THRESHOLD {
        MomentumTrend::Falling
    } else {
        MomentumTrend::Steady
    }
}

// ---------------------------------------------------------------------------
// Streaks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakInfo {
    /// Consecutive top finishes ending at the submitter's latest placement.
    pub current_streak: usize,
    pub max_streak: usize,
    pub total_top_finishes: usize,
}

/// Runs of placements at or above `top_n`, in competition order.
pub fn hot_streak_detection(ds: &dyn Dataset, submitter: &CompetitorId, top_n: usize) -> StreakInfo {
    streak_from_rankings(&round_rankings(ds), submitter, top_n)
}

pub(crate) fn streak_from_rankings(
    rankings: &[RoundRanking],
    submitter: &CompetitorId,
    top_n: usize,
) -> StreakInfo {
    let tops: Vec<bool> = rankings
        .iter()
        .filter(|r| &r.submitter_id == submitter)
        .map(|r| r.rank <= top_n)
        .collect();

    let mut info = StreakInfo::default();
    let mut run = 0;
    for &top in &tops {
        if top {
            run += 1;
            info.total_top_finishes += 1;
            info.max_streak = info.max_streak.max(run);
        } else {
            run = 0;
        }
    }
    info.current_streak = tops.iter().rev().take_while(|&&top| top).count();
    info
}

/// One row of the momentum table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumRecord {
    pub submitter_id: CompetitorId,
    pub name: String,
    pub momentum: f64,
    pub trend: MomentumTrend,
    pub current_streak: usize,
    pub max_streak: usize,
}

/// Momentum and streaks for every competitor, sorted by momentum descending.
pub fn all_momentum_scores(ds: &dyn Dataset, top_n: usize) -> Vec<MomentumRecord> {
    let rankings = round_rankings(ds);
    let mut records: Vec<MomentumRecord> = ds
        .competitors()
        .iter()
        .map(|c| {
            let momentum = momentum_score(ds, &c.id);
            let streak = streak_from_rankings(&rankings, &c.id, top_n);
            MomentumRecord {
                submitter_id: c.id.clone(),
                name: c.name.clone(),
                momentum,
                trend: momentum_trend(momentum),
                current_streak: streak.current_streak,
                max_streak: streak.max_streak,
            }
        })
        .collect();
    records.sort_by_key(|r| std::cmp::Reverse(OrderedFloat(r.momentum)));
    records
}

// ---------------------------------------------------------------------------
// Shape of a run
// ---------------------------------------------------------------------------

/// Mean of the second half of the submitter's round totals minus the mean
/// of the first half, split at `len / 2`. `0.0` below two rounds.
pub fn finishing_strength(ds: &dyn Dataset, submitter: &CompetitorId) -> f64 {
    finishing_strength_of(&round_scores(ds, submitter))
}

pub(crate) fn finishing_strength_of(scores: &[RoundScore]) -> f64 {
    if scores.len() < 2 {
        return 0.0;
    }
    let points: Vec<u64> = scores.iter().map(|s| s.points).collect();
    let (first, second) = points.split_at(points.len() / 2);
    stats::mean(second) - stats::mean(first)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakRound {
    /// 1-based position of the round in the league.
    pub round_num: usize,
    pub round_id: RoundId,
    pub points: u64,
}

/// The submitter's highest-scoring round; the earliest wins a tie.
pub fn peak_round(ds: &dyn Dataset, submitter: &CompetitorId) -> Option<PeakRound> {
    peak_of(&round_scores(ds, submitter))
}

pub(crate) fn peak_of(scores: &[RoundScore]) -> Option<PeakRound> {
    let mut best: Option<&RoundScore> = None;
    for s in scores {
        if best.is_none_or(|b| s.points > b.points) {
            best = Some(s);
        }
    }
    best.map(|s| PeakRound {
        round_num: s.round_index + 1,
        round_id: s.round_id.clone(),
        points: s.points,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestStretch {
    /// 1-based league position of the first round in the stretch.
    pub start_round: usize,
    pub round_ids: Vec<RoundId>,
    pub total_points: u64,
    pub avg_points: f64,
}

/// The `window` consecutive entered rounds with the highest point sum;
/// the earliest wins a tie. With fewer entered rounds than `window`, all
/// of them form the stretch. A window of `0` is treated as `1`.
pub fn best_stretch(ds: &dyn Dataset, submitter: &CompetitorId, window: usize) -> Option<BestStretch> {
    stretch_of(&round_scores(ds, submitter), window)
}

pub(crate) fn stretch_of(scores: &[RoundScore], window: usize) -> Option<BestStretch> {
    let first = scores.first()?;
    let window = window.max(1);
    if scores.len() < window {
        let total: u64 = scores.iter().map(|s| s.points).sum();
        return Some(BestStretch {
            start_round: first.round_index + 1,
            round_ids: scores.iter().map(|s| s.round_id.clone()).collect(),
            total_points: total,
            avg_points: total as f64 / scores.len() as f64,
        });
    }

    let mut best_start = 0;
    let mut best_total = 0;
    for (start, w) in scores.windows(window).enumerate() {
        let total: u64 = w.iter().map(|s| s.points).sum();
        if start == 0 || total > best_total {
            best_start = start;
            best_total = total;
        }
    }
    let stretch = &scores[best_start..best_start + window];
    Some(BestStretch {
        start_round: stretch[0].round_index + 1,
        round_ids: stretch.iter().map(|s| s.round_id.clone()).collect(),
        total_points: best_total,
        avg_points: best_total as f64 / window as f64,
    })
}
