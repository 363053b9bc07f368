//! Trait interfaces between the dataset provider and the metrics engine.
//!
//! - [`TrackLookup`]: external item metadata, popularity in particular
//!   (injected, never a process-wide client)
//! - [`Dataset`]: read-only league snapshot (setlist-core's [`League`](crate::League)
//!   implements it; tests provide fakes)

use crate::constants::{MAX_POPULARITY, UNKNOWN_NAME};
use crate::types::{Competitor, CompetitorId, ItemId, RoundId, Submission, TrackInfo, Vote};

/// Resolves item metadata supplied by an external music service.
///
/// Implementations must not block or perform I/O; the lookup is expected to
/// be a pre-fetched table or an equivalent in-memory capability.
pub trait TrackLookup: Send + Sync {
    /// Metadata for an item. Returns `None` if the item is unknown.
    fn track(&self, item: &ItemId) -> Option<TrackInfo>;

    /// Popularity on the 0–100 scale.
    ///
    /// Default implementation reads [`track`](Self::track), clamps to
    /// [`MAX_POPULARITY`] and falls back to `0` for unresolved items.
    fn popularity(&self, item: &ItemId) -> u8 {
        self.track(item)
            .map(|t| t.popularity.min(MAX_POPULARITY))
            .unwrap_or(0)
    }
}

/// Read-only view of one league snapshot.
///
/// Rounds are ordered chronologically; competitors keep their provider
/// order, which fixes the node order of every per-competitor table.
pub trait Dataset: Send + Sync {
    /// Round ids in competition order.
    fn rounds(&self) -> &[RoundId];

    /// All competitors, in provider order.
    fn competitors(&self) -> &[Competitor];

    /// All submissions, in encounter order.
    fn submissions(&self) -> &[Submission];

    /// All votes, in encounter order. Includes zero-point entries.
    fn votes(&self) -> &[Vote];

    /// Item metadata capability.
    fn tracks(&self) -> &dyn TrackLookup;

    /// Look up a competitor by id.
    fn competitor(&self, id: &CompetitorId) -> Option<&Competitor> {
        self.competitors().iter().find(|c| &c.id == id)
    }

    /// Display name for a competitor, or `"Unknown"`.
    fn competitor_name(&self, id: &CompetitorId) -> &str {
        self.competitor(id)
            .map(|c| c.name.as_str())
            .unwrap_or(UNKNOWN_NAME)
    }

    /// Metadata for an item, or the unknown placeholder.
    fn track_info(&self, item: &ItemId) -> TrackInfo {
        self.tracks().track(item).unwrap_or_else(TrackInfo::unknown)
    }

    /// Popularity for an item on the 0–100 scale (`0` if unresolved).
    fn popularity(&self, item: &ItemId) -> u8 {
        self.tracks().popularity(item)
    }

    /// Position of a round in competition order.
    fn round_index(&self, round: &RoundId) -> Option<usize> {
        self.rounds().iter().position(|r| r == round)
    }

    /// Submitter of an item in a round. The first matching submission wins.
    fn submitter_for(&self, item: &ItemId, round: &RoundId) -> Option<&CompetitorId> {
        self.submissions()
            .iter()
            .find(|s| &s.item_id == item && &s.round_id == round)
            .map(|s| &s.submitter_id)
    }

    /// Point values of every vote on an item, optionally limited to one round.
    fn votes_for_item(&self, item: &ItemId, round: Option<&RoundId>) -> Vec<u32> {
        self.votes()
            .iter()
            .filter(|v| &v.item_id == item && round_matches(round, &v.round_id))
            .map(|v| v.points)
            .collect()
    }

    /// Submissions made by one competitor, optionally limited to one round.
    fn submissions_by(&self, submitter: &CompetitorId, round: Option<&RoundId>) -> Vec<&Submission> {
        self.submissions()
            .iter()
            .filter(|s| &s.submitter_id == submitter && round_matches(round, &s.round_id))
            .collect()
    }
}

/// `true` when no round filter is set or the filter names `round`.
pub fn round_matches(filter: Option<&RoundId>, round: &RoundId) -> bool {
    filter.is_none_or(|r| r == round)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // ------------------------------------------------------------------
    // Mock: TrackLookup
    // ------------------------------------------------------------------

    struct MockTracks {
        tracks: HashMap<ItemId, TrackInfo>,
    }

    impl TrackLookup for MockTracks {
        fn track(&self, item: &ItemId) -> Option<TrackInfo> {
            self.tracks.get(item).cloned()
        }
    }

    // ------------------------------------------------------------------
    // Mock: Dataset
    // ------------------------------------------------------------------

    struct MockDataset {
        rounds: Vec<RoundId>,
        competitors: Vec<Competitor>,
        submissions: Vec<Submission>,
        votes: Vec<Vote>,
        tracks: MockTracks,
    }

    impl Dataset for MockDataset {
        fn rounds(&self) -> &[RoundId] {
            &self.rounds
        }

        fn competitors(&self) -> &[Competitor] {
            &self.competitors
        }

        fn submissions(&self) -> &[Submission] {
            &self.submissions
        }

        fn votes(&self) -> &[Vote] {
            &self.votes
        }

        fn tracks(&self) -> &dyn TrackLookup {
            &self.tracks
        }
    }

    fn track(popularity: u8) -> TrackInfo {
        TrackInfo {
            name: "Song".into(),
            artist: "Band".into(),
            popularity,
            release_date: None,
        }
    }

    fn vote(round: &str, voter: &str, item: &str, points: u32) -> Vote {
        Vote {
            round_id: round.into(),
            voter_id: voter.into(),
            item_id: item.into(),
            points,
            comment: String::new(),
        }
    }

    fn submission(round: &str, submitter: &str, item: &str) -> Submission {
        Submission {
            round_id: round.into(),
            submitter_id: submitter.into(),
            item_id: item.into(),
            comment: String::new(),
        }
    }

    fn mock() -> MockDataset {
        let mut tracks = HashMap::new();
        tracks.insert(ItemId::from("x"), track(40));
        tracks.insert(ItemId::from("loud"), track(250));
        MockDataset {
            rounds: vec!["r1".into(), "r2".into()],
            competitors: vec![
                Competitor { id: "a".into(), name: "Alice".into() },
                Competitor { id: "b".into(), name: "Bob".into() },
            ],
            submissions: vec![submission("r1", "a", "x"), submission("r2", "b", "x")],
            votes: vec![
                vote("r1", "b", "x", 3),
                vote("r1", "a", "x", 0),
                vote("r2", "a", "x", 2),
            ],
            tracks: MockTracks { tracks },
        }
    }

    // --- TrackLookup defaults ---

    #[test]
    fn popularity_resolves_known_item() {
        let ds = mock();
        assert_eq!(ds.popularity(&"x".into()), 40);
    }

    #[test]
    fn popularity_defaults_to_zero() {
        let ds = mock();
        assert_eq!(ds.popularity(&"nope".into()), 0);
    }

    #[test]
    fn popularity_is_clamped() {
        let ds = mock();
        assert_eq!(ds.popularity(&"loud".into()), MAX_POPULARITY);
    }

    #[test]
    fn track_info_falls_back_to_placeholder() {
        let ds = mock();
        assert_eq!(ds.track_info(&"nope".into()), TrackInfo::unknown());
        assert_eq!(ds.track_info(&"x".into()).name, "Song");
    }

    // --- Dataset defaults ---

    #[test]
    fn competitor_name_resolves_or_unknown() {
        let ds = mock();
        assert_eq!(ds.competitor_name(&"a".into()), "Alice");
        assert_eq!(ds.competitor_name(&"zz".into()), UNKNOWN_NAME);
    }

    #[test]
    fn round_index_follows_competition_order() {
        let ds = mock();
        assert_eq!(ds.round_index(&"r1".into()), Some(0));
        assert_eq!(ds.round_index(&"r2".into()), Some(1));
        assert_eq!(ds.round_index(&"r9".into()), None);
    }

    #[test]
    fn submitter_for_is_round_scoped() {
        let ds = mock();
        assert_eq!(ds.submitter_for(&"x".into(), &"r1".into()), Some(&CompetitorId::from("a")));
        assert_eq!(ds.submitter_for(&"x".into(), &"r2".into()), Some(&CompetitorId::from("b")));
        assert_eq!(ds.submitter_for(&"y".into(), &"r1".into()), None);
    }

    #[test]
    fn votes_for_item_includes_zero_points() {
        let ds = mock();
        assert_eq!(ds.votes_for_item(&"x".into(), None), vec![3, 0, 2]);
        assert_eq!(ds.votes_for_item(&"x".into(), Some(&"r1".into())), vec![3, 0]);
        assert_eq!(ds.votes_for_item(&"x".into(), Some(&"r2".into())), vec![2]);
    }

    #[test]
    fn submissions_by_filters_round() {
        let ds = mock();
        assert_eq!(ds.submissions_by(&"a".into(), None).len(), 1);
        assert!(ds.submissions_by(&"a".into(), Some(&"r2".into())).is_empty());
    }

    #[test]
    fn round_matches_without_filter() {
        assert!(round_matches(None, &"r1".into()));
        assert!(round_matches(Some(&"r1".into()), &"r1".into()));
        assert!(!round_matches(Some(&"r2".into()), &"r1".into()));
    }

    // ------------------------------------------------------------------
    // Object safety: verify each trait is dyn-compatible
    // ------------------------------------------------------------------

    fn _assert_dataset_object_safe(ds: &dyn Dataset) {
        let _ = ds.rounds();
    }

    fn _assert_track_lookup_object_safe(tl: &dyn TrackLookup) {
        let _ = tl.popularity(&ItemId::default());
    }

    #[test]
    fn dataset_usable_as_trait_object() {
        let ds = mock();
        let dyn_ds: &dyn Dataset = &ds;
        assert_eq!(dyn_ds.competitors().len(), 2);
    }
}
