//! Per-submitter metrics: points received, consistency, underdog factor,
//! biggest fan and nemesis.
//!
//! Each submission is scored against its own round, so an item entered
//! twice in different rounds is two independent results.

use std::collections::HashMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use setlist_core::stats;
use setlist_core::{CompetitorId, Dataset, RoundId};

use crate::songs::total_points;

/// Points received by each of the submitter's submissions, in submission order.
pub fn submission_totals(ds: &dyn Dataset, submitter: &CompetitorId, round: Option<&RoundId>) -> Vec<u64> {
    ds.submissions_by(submitter, round)
        .into_iter()
        .map(|s| total_points(ds, &s.item_id, Some(&s.round_id)))
        .collect()
}

/// Mean points per submission; `0.0` if the submitter has none.
pub fn average_points_per_submission(
    ds: &dyn Dataset,
    submitter: &CompetitorId,
    round: Option<&RoundId>,
) -> f64 {
    stats::mean(&submission_totals(ds, submitter, round))
}

/// `(mean, population std dev)` of per-submission totals.
pub fn consistency_score(ds: &dyn Dataset, submitter: &CompetitorId, round: Option<&RoundId>) -> (f64, f64) {
    stats::mean_std(&submission_totals(ds, submitter, round))
}

/// `total points / (average popularity of the submitted items + 1)`.
pub fn underdog_factor(ds: &dyn Dataset, submitter: &CompetitorId, round: Option<&RoundId>) -> f64 {
    let submissions = ds.submissions_by(submitter, round);
    if submissions.is_empty() {
        return 0.0;
    }
    let total: u64 = submissions
        .iter()
        .map(|s| total_points(ds, &s.item_id, Some(&s.round_id)))
        .sum();
    let popularity: Vec<u8> = submissions.iter().map(|s| ds.popularity(&s.item_id)).collect();
    total as f64 / (stats::mean(&popularity) + 1.0)
}

/// How one voter treated one submitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoterAffinity {
    pub voter_id: CompetitorId,
    pub name: String,
    pub avg_points: f64,
    pub total_points: u64,
    pub num_votes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanAndNemesis {
    pub biggest_fan: VoterAffinity,
    pub nemesis: VoterAffinity,
}

/// The voters with the highest and lowest average points on this
/// submitter's items. Zero-point votes count; the submitter's own votes do not.
///
/// Ties go to the voter seen last (fan) and first (nemesis). `None` if no
/// one else voted on the submitter's items.
pub fn biggest_fan_and_nemesis(
    ds: &dyn Dataset,
    submitter: &CompetitorId,
    round: Option<&RoundId>,
) -> Option<FanAndNemesis> {
    let submissions = ds.submissions_by(submitter, round);

    let mut order: Vec<&CompetitorId> = Vec::new();
    let mut points: HashMap<&CompetitorId, Vec<u32>> = HashMap::new();
    for s in &submissions {
        for v in ds.votes() {
            if v.item_id != s.item_id || v.round_id != s.round_id || &v.voter_id == submitter {
                continue;
            }
            points
                .entry(&v.voter_id)
                .or_insert_with(|| {
                    order.push(&v.voter_id);
                    Vec::new()
                })
                .push(v.points);
        }
    }

    let mut affinities: Vec<VoterAffinity> = order
        .into_iter()
        .map(|voter| {
            let given = points.get(voter).map(Vec::as_slice).unwrap_or_default();
            VoterAffinity {
                voter_id: voter.clone(),
                name: ds.competitor_name(voter).to_string(),
                avg_points: stats::mean(given),
                total_points: given.iter().map(|&p| u64::from(p)).sum(),
                num_votes: given.len(),
            }
        })
        .collect();
    affinities.sort_by_key(|a| OrderedFloat(a.avg_points));

    let nemesis = affinities.first()?.clone();
    let biggest_fan = affinities.last()?.clone();
    Some(FanAndNemesis { biggest_fan, nemesis })
}

/// One row of the submitter table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitterRecord {
    pub submitter_id: CompetitorId,
    pub name: String,
    pub num_submissions: usize,
    pub total_points: u64,
    pub avg_points: f64,
    pub consistency: f64,
    pub underdog: f64,
    pub fan_and_nemesis: Option<FanAndNemesis>,
}

/// One record per competitor with at least one submission, sorted by
/// average points descending (ties keep competitor order).
pub fn all_submitter_metrics(ds: &dyn Dataset, round: Option<&RoundId>) -> Vec<SubmitterRecord> {
    let mut records: Vec<SubmitterRecord> = ds
        .competitors()
        .iter()
        .filter_map(|c| {
            let totals = submission_totals(ds, &c.id, round);
            if totals.is_empty() {
                return None;
            }
            let (avg_points, consistency) = stats::mean_std(&totals);
            Some(SubmitterRecord {
                submitter_id: c.id.clone(),
                name: c.name.clone(),
                num_submissions: totals.len(),
                total_points: totals.iter().sum(),
                avg_points,
                consistency,
                underdog: underdog_factor(ds, &c.id, round),
                fan_and_nemesis: biggest_fan_and_nemesis(ds, &c.id, round),
            })
        })
        .collect();
    records.sort_by_key(|r| std::cmp::Reverse(OrderedFloat(r.avg_points)));
    debug!(submitters = records.len(), "submitters: metrics computed");
    records
}
