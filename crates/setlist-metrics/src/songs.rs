//! Per-submission metrics: total points, controversy, obscurity, vote histogram.
//!
//! Every function takes an optional round filter. With `None` the item's
//! votes across all rounds are pooled; [`all_song_metrics`] always scores a
//! submission against its own round.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use setlist_core::stats;
use setlist_core::traits::round_matches;
use setlist_core::{CompetitorId, Dataset, ItemId, RoundId};

/// Sum of points over the item's votes.
pub fn total_points(ds: &dyn Dataset, item: &ItemId, round: Option<&RoundId>) -> u64 {
    ds.votes_for_item(item, round)
        .into_iter()
        .map(u64::from)
        .sum()
}

/// Population standard deviation of the item's vote points, zero-point
/// entries included. `0.0` with fewer than two votes.
pub fn controversy_score(ds: &dyn Dataset, item: &ItemId, round: Option<&RoundId>) -> f64 {
    let points = ds.votes_for_item(item, round);
    if points.len() < 2 {
        return 0.0;
    }
    stats::std_dev(&points)
}

/// `total_points / (popularity + 1)`.
pub fn obscurity_score(ds: &dyn Dataset, item: &ItemId, round: Option<&RoundId>) -> f64 {
    obscurity(total_points(ds, item, round), ds.popularity(item))
}

pub(crate) fn obscurity(total: u64, popularity: u8) -> f64 {
    total as f64 / (f64::from(popularity) + 1.0)
}

/// Histogram of observed point values.
pub fn vote_distribution(
    ds: &dyn Dataset,
    item: &ItemId,
    round: Option<&RoundId>,
) -> BTreeMap<u32, usize> {
    let mut histogram = BTreeMap::new();
    for points in ds.votes_for_item(item, round) {
        *histogram.entry(points).or_insert(0) += 1;
    }
    histogram
}

/// One row of the song table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    pub item_id: ItemId,
    pub round_id: RoundId,
    pub name: String,
    pub artist: String,
    pub submitter_id: CompetitorId,
    pub submitter_name: String,
    pub popularity: u8,
    pub release_date: Option<String>,
    pub total_points: u64,
    pub controversy: f64,
    pub obscurity: f64,
    /// Votes carrying at least one point.
    pub num_votes: usize,
    pub vote_distribution: BTreeMap<u32, usize>,
}

/// One record per submission, sorted by total points descending.
/// Ties keep submission order.
pub fn all_song_metrics(ds: &dyn Dataset, round: Option<&RoundId>) -> Vec<SongRecord> {
    let mut records: Vec<SongRecord> = ds
        .submissions()
        .iter()
        .filter(|s| round_matches(round, &s.round_id))
        .map(|s| {
            let item = &s.item_id;
            let own_round = Some(&s.round_id);
            let info = ds.track_info(item);
            let points = ds.votes_for_item(item, own_round);
            SongRecord {
                item_id: item.clone(),
                round_id: s.round_id.clone(),
                name: info.name,
                artist: info.artist,
                submitter_id: s.submitter_id.clone(),
                submitter_name: ds.competitor_name(&s.submitter_id).to_string(),
                popularity: ds.popularity(item),
                release_date: info.release_date,
                total_points: total_points(ds, item, own_round),
                controversy: controversy_score(ds, item, own_round),
                obscurity: obscurity_score(ds, item, own_round),
                num_votes: points.iter().filter(|&&p| p > 0).count(),
                vote_distribution: vote_distribution(ds, item, own_round),
            }
        })
        .collect();

    records.sort_by(|a, b| b.total_points.cmp(&a.total_points));
    debug!(songs = records.len(), round = ?round.map(RoundId::as_str), "songs: metrics computed");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use setlist_core::League;

    fn league() -> League {
        League::new("songs")
            .with_round("r1")
            .with_round("r2")
            .with_competitor("a", "Alice")
            .with_competitor("b", "Bob")
            .with_competitor("c", "Cara")
            .with_submission("r1", "a", "flat")
            .with_submission("r1", "b", "split")
            .with_submission("r1", "c", "lonely")
            .with_submission("r2", "a", "split")
            .with_vote("r1", "b", "flat", 5)
            .with_vote("r1", "c", "flat", 5)
            .with_vote("r1", "a", "flat", 5)
            .with_vote("r1", "a", "split", 1)
            .with_vote("r1", "c", "split", 5)
            .with_vote("r1", "a", "lonely", 4)
            .with_vote("r2", "b", "split", 2)
            .with_vote("r2", "c", "split", 0)
            .with_track("flat", "Flat", "Even Band", 60)
            .with_track("split", "Split", "Divided", 0)
    }

    // --- total_points ---

    #[test]
    fn total_points_pools_rounds_without_filter() {
        let l = league();
        assert_eq!(total_points(&l, &"split".into(), None), 8);
        assert_eq!(total_points(&l, &"split".into(), Some(&"r1".into())), 6);
        assert_eq!(total_points(&l, &"split".into(), Some(&"r2".into())), 2);
    }

    #[test]
    fn total_points_of_unvoted_item_is_zero() {
        let l = league();
        assert_eq!(total_points(&l, &"ghost".into(), None), 0);
    }

    // --- controversy ---

    #[test]
    fn controversy_of_unanimous_votes_is_zero() {
        let l = league();
        assert_eq!(controversy_score(&l, &"flat".into(), None), 0.0);
    }

    #[test]
    fn controversy_is_population_std_dev() {
        let l = league();
        // [1, 5] -> 2.0
        let c = controversy_score(&l, &"split".into(), Some(&"r1".into()));
        assert!((c - 2.0).abs() < 1e-12);
    }

    #[test]
    fn controversy_of_single_vote_is_zero() {
        let l = league();
        assert_eq!(controversy_score(&l, &"lonely".into(), None), 0.0);
    }

    #[test]
    fn controversy_counts_zero_point_votes() {
        let l = league();
        // r2: [2, 0] -> 1.0
        let c = controversy_score(&l, &"split".into(), Some(&"r2".into()));
        assert!((c - 1.0).abs() < 1e-12);
    }

    // --- obscurity ---

    #[test]
    fn obscurity_divides_by_popularity_plus_one() {
        let l = league();
        assert!((obscurity_score(&l, &"flat".into(), None) - 15.0 / 61.0).abs() < 1e-12);
        assert_eq!(obscurity_score(&l, &"split".into(), None), 8.0);
    }

    #[test]
    fn obscurity_of_unresolved_item_uses_zero_popularity() {
        let l = league();
        assert_eq!(obscurity_score(&l, &"lonely".into(), None), 4.0);
    }

    // --- vote_distribution ---

    #[test]
    fn distribution_counts_each_value() {
        let l = league();
        let d = vote_distribution(&l, &"split".into(), None);
        assert_eq!(d.get(&0), Some(&1));
        assert_eq!(d.get(&1), Some(&1));
        assert_eq!(d.get(&2), Some(&1));
        assert_eq!(d.get(&5), Some(&1));
        assert_eq!(d.values().sum::<usize>(), 4);
    }

    // --- all_song_metrics ---

    #[test]
    fn all_song_metrics_sorted_descending() {
        let l = league();
        let rows = all_song_metrics(&l, None);
        assert_eq!(rows.len(), 4);
        let totals: Vec<u64> = rows.iter().map(|r| r.total_points).collect();
        assert_eq!(totals, vec![15, 6, 4, 2]);
    }

    #[test]
    fn all_song_metrics_scores_submission_in_own_round() {
        let l = league();
        let rows = all_song_metrics(&l, None);
        let r2 = rows.iter().find(|r| r.round_id.as_str() == "r2").unwrap();
        assert_eq!(r2.total_points, 2);
        assert_eq!(r2.num_votes, 1);
        assert_eq!(r2.submitter_name, "Alice");
    }

    #[test]
    fn all_song_metrics_round_filter() {
        let l = league();
        let rows = all_song_metrics(&l, Some(&"r2".into()));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item_id.as_str(), "split");
    }

    #[test]
    fn all_song_metrics_unknown_track_placeholder() {
        let l = league();
        let rows = all_song_metrics(&l, None);
        let lonely = rows.iter().find(|r| r.item_id.as_str() == "lonely").unwrap();
        assert_eq!(lonely.name, "Unknown");
        assert_eq!(lonely.popularity, 0);
    }

    #[test]
    fn all_song_metrics_ties_keep_submission_order() {
        let l = League::new("ties")
            .with_round("r1")
            .with_competitor("a", "A")
            .with_competitor("b", "B")
            .with_submission("r1", "a", "x")
            .with_submission("r1", "b", "y")
            .with_vote("r1", "a", "y", 3)
            .with_vote("r1", "b", "x", 3);
        let rows = all_song_metrics(&l, None);
        assert_eq!(rows[0].item_id.as_str(), "x");
        assert_eq!(rows[1].item_id.as_str(), "y");
    }

    #[test]
    fn all_song_metrics_empty_dataset() {
        assert!(all_song_metrics(&League::new("empty"), None).is_empty());
    }

    // --- proptest ---

    proptest! {
        #[test]
        fn obscurity_increasing_in_points(total in 0u64..10_000, pop in 0u8..=100) {
            prop_assert!(obscurity(total + 1, pop) > obscurity(total, pop));
        }

        #[test]
        fn obscurity_decreasing_in_popularity(total in 1u64..10_000, pop in 0u8..100) {
            prop_assert!(obscurity(total, pop + 1) < obscurity(total, pop));
        }

        #[test]
        fn controversy_non_negative(points in prop::collection::vec(0u32..10, 0..12)) {
            let mut l = League::new("p").with_round("r").with_competitor("s", "S")
                .with_submission("r", "s", "x");
            for (i, p) in points.iter().enumerate() {
                l = l.with_vote("r", format!("v{i}").as_str(), "x", *p);
            }
            prop_assert!(controversy_score(&l, &"x".into(), None) >= 0.0);
        }
    }
}
