//! Per-voter metrics: generosity, voting range, hipster score, golden ear,
//! pairwise similarity and loyalty.
//!
//! Zero-point votes are abstentions and are left out of every measure here
//! except the similarity matrix, where an unvoted item is an explicit `0`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use setlist_core::constants::{GOLDEN_EAR_MIN_PAIRS, HIPSTER_MIN_POINTS, MAX_POPULARITY};
use setlist_core::stats;
use setlist_core::traits::round_matches;
use setlist_core::{CompetitorId, Dataset, ItemId, RoundId, Vote};

fn cast_votes<'a>(
    ds: &'a dyn Dataset,
    voter: &'a CompetitorId,
    round: Option<&'a RoundId>,
) -> impl Iterator<Item = &'a Vote> + 'a {
    ds.votes()
        .iter()
        .filter(move |v| &v.voter_id == voter && v.is_cast() && round_matches(round, &v.round_id))
}

/// Nonzero point values assigned by a voter.
pub fn voter_scores(ds: &dyn Dataset, voter: &CompetitorId, round: Option<&RoundId>) -> Vec<u32> {
    cast_votes(ds, voter, round).map(|v| v.points).collect()
}

/// `(mean, population std dev)` of the voter's nonzero votes; `(0, 0)` if none.
pub fn generosity_score(ds: &dyn Dataset, voter: &CompetitorId, round: Option<&RoundId>) -> (f64, f64) {
    stats::mean_std(&voter_scores(ds, voter, round))
}

/// `(min, max, max - min)` of the voter's nonzero votes; `(0, 0, 0.0)` if none.
pub fn voting_range(ds: &dyn Dataset, voter: &CompetitorId, round: Option<&RoundId>) -> (u32, u32, f64) {
    let scores = voter_scores(ds, voter, round);
    match (scores.iter().min(), scores.iter().max()) {
        (Some(&lo), Some(&hi)) => (lo, hi, f64::from(hi - lo)),
        _ => (0, 0, 0.0),
    }
}

/// Points-weighted mean of `100 - popularity` over votes worth at least
/// [`HIPSTER_MIN_POINTS`]. `0.0` if no vote qualifies.
pub fn hipster_score(ds: &dyn Dataset, voter: &CompetitorId, round: Option<&RoundId>) -> f64 {
    let mut weighted = 0.0;
    let mut weight = 0u64;
    for v in cast_votes(ds, voter, round).filter(|v| v.points >= HIPSTER_MIN_POINTS) {
        let obscurity = f64::from(MAX_POPULARITY - ds.popularity(&v.item_id));
        weighted += obscurity * f64::from(v.points);
        weight += u64::from(v.points);
    }
    if weight == 0 {
        return 0.0;
    }
    weighted / weight as f64
}

/// Spearman correlation between the voter's points on each item and the
/// points every other voter gave that item.
///
/// Items nobody else voted on are skipped. `0.0` with fewer than
/// [`GOLDEN_EAR_MIN_PAIRS`] usable items or an undefined correlation.
pub fn golden_ear_score(ds: &dyn Dataset, voter: &CompetitorId, round: Option<&RoundId>) -> f64 {
    // A repeated (item, round) vote overwrites the earlier one.
    let mut own: BTreeMap<(&ItemId, &RoundId), u32> = BTreeMap::new();
    for v in cast_votes(ds, voter, round) {
        own.insert((&v.item_id, &v.round_id), v.points);
    }
    if own.len() < GOLDEN_EAR_MIN_PAIRS {
        return 0.0;
    }

    let mut others: HashMap<(&ItemId, &RoundId), u64> = HashMap::new();
    for v in ds.votes().iter().filter(|v| &v.voter_id != voter) {
        let key = (&v.item_id, &v.round_id);
        if own.contains_key(&key) {
            *others.entry(key).or_insert(0) += u64::from(v.points);
        }
    }

    let (mine, theirs): (Vec<f64>, Vec<f64>) = own
        .iter()
        .filter_map(|(key, &points)| others.get(key).map(|&sum| (f64::from(points), sum as f64)))
        .unzip();
    if mine.len() < GOLDEN_EAR_MIN_PAIRS {
        return 0.0;
    }
    stats::finite_or_zero(stats::spearman(&mine, &theirs))
}

/// Pairwise voter agreement over all competitors, in competitor order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    pub ids: Vec<CompetitorId>,
    pub names: Vec<String>,
    /// Row-major, `values[i][j]` is the correlation of voters `i` and `j`.
    pub values: Vec<Vec<f64>>,
}

impl SimilarityMatrix {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Correlation between two voters, if both are in the matrix.
    pub fn get(&self, a: &CompetitorId, b: &CompetitorId) -> Option<f64> {
        let i = self.ids.iter().position(|id| id == a)?;
        let j = self.ids.iter().position(|id| id == b)?;
        Some(self.values[i][j])
    }

    /// Mean of the strictly upper-triangular cells; `0.0` below two voters.
    pub fn mean_off_diagonal(&self) -> f64 {
        let cells: Vec<f64> = (0..self.len())
            .flat_map(|i| ((i + 1)..self.len()).map(move |j| (i, j)))
            .map(|(i, j)| self.values[i][j])
            .collect();
        stats::mean(&cells)
    }
}

/// Spearman correlation of every pair of voters' point vectors. Each pair
/// is compared over the `(item, round)` pairs that either of the two voted
/// on, with an item only one of them voted on counting as `0` for the
/// other. The diagonal is exactly `1.0`.
pub fn voter_similarity_matrix(ds: &dyn Dataset, round: Option<&RoundId>) -> SimilarityMatrix {
    let competitors = ds.competitors();
    let n = competitors.len();
    let slot: HashMap<&CompetitorId, usize> =
        competitors.iter().enumerate().map(|(i, c)| (&c.id, i)).collect();

    // The first vote by a voter on an item is the one that counts.
    let mut ballots: Vec<Ballot<'_>> = vec![BTreeMap::new(); n];
    for v in ds.votes().iter().filter(|v| round_matches(round, &v.round_id)) {
        if let Some(&i) = slot.get(&v.voter_id) {
            ballots[i].entry((&v.item_id, &v.round_id)).or_insert(v.points);
        }
    }

    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        values[i][i] = 1.0;
        for j in (i + 1)..n {
            let rho = pair_similarity(&ballots[i], &ballots[j]);
            values[i][j] = rho;
            values[j][i] = rho;
        }
    }

    debug!(voters = n, "voters: similarity matrix built");
    SimilarityMatrix {
        ids: competitors.iter().map(|c| c.id.clone()).collect(),
        names: competitors.iter().map(|c| c.name.clone()).collect(),
        values,
    }
}

type Ballot<'a> = BTreeMap<(&'a ItemId, &'a RoundId), u32>;

fn pair_similarity<'a>(a: &Ballot<'a>, b: &Ballot<'a>) -> f64 {
    let union: BTreeSet<(&ItemId, &RoundId)> = a.keys().chain(b.keys()).copied().collect();
    let mut xs = Vec::with_capacity(union.len());
    let mut ys = Vec::with_capacity(union.len());
    for key in &union {
        xs.push(f64::from(a.get(key).copied().unwrap_or(0)));
        ys.push(f64::from(b.get(key).copied().unwrap_or(0)));
    }
    stats::finite_or_zero(stats::spearman(&xs, &ys))
}

/// Mean nonzero points the voter gave each submitter, self excluded.
/// Votes on items with no resolvable submitter are skipped.
pub fn loyalty_index(
    ds: &dyn Dataset,
    voter: &CompetitorId,
    round: Option<&RoundId>,
) -> BTreeMap<CompetitorId, f64> {
    let mut given: BTreeMap<CompetitorId, Vec<u32>> = BTreeMap::new();
    for v in cast_votes(ds, voter, round) {
        match ds.submitter_for(&v.item_id, &v.round_id) {
            Some(submitter) if submitter != voter => {
                given.entry(submitter.clone()).or_default().push(v.points);
            }
            _ => {}
        }
    }
    given
        .into_iter()
        .map(|(submitter, points)| (submitter, stats::mean(&points)))
        .collect()
}

/// One row of the voter table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoterRecord {
    pub voter_id: CompetitorId,
    pub name: String,
    pub generosity_mean: f64,
    pub generosity_std: f64,
    pub min_points: u32,
    pub max_points: u32,
    pub points_range: f64,
    pub hipster: f64,
    pub golden_ear: f64,
    /// Votes carrying at least one point.
    pub num_votes: usize,
    pub loyalty: BTreeMap<CompetitorId, f64>,
}

/// One record per competitor, in competitor order.
pub fn all_voter_metrics(ds: &dyn Dataset, round: Option<&RoundId>) -> Vec<VoterRecord> {
    let records: Vec<VoterRecord> = ds
        .competitors()
        .iter()
        .map(|c| {
            let (generosity_mean, generosity_std) = generosity_score(ds, &c.id, round);
            let (min_points, max_points, points_range) = voting_range(ds, &c.id, round);
            VoterRecord {
                voter_id: c.id.clone(),
                name: c.name.clone(),
                generosity_mean,
                generosity_std,
                min_points,
                max_points,
                points_range,
                hipster: hipster_score(ds, &c.id, round),
                golden_ear: golden_ear_score(ds, &c.id, round),
                num_votes: cast_votes(ds, &c.id, round).count(),
                loyalty: loyalty_index(ds, &c.id, round),
            }
        })
        .collect();
    debug!(voters = records.len(), "voters: metrics computed");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use setlist_core::League;

    fn id(s: &str) -> CompetitorId {
        CompetitorId::from(s)
    }

    /// Three voters on three items in one round plus a second round.
    ///
    /// Group totals excluding `a`: x=9, y=5, z=1. `a` ranks them the same way.
    fn league() -> League {
        League::new("voters")
            .with_round("r1")
            .with_round("r2")
            .with_competitor("a", "Alice")
            .with_competitor("b", "Bob")
            .with_competitor("c", "Cara")
            .with_competitor("d", "Dev")
            .with_submission("r1", "b", "x")
            .with_submission("r1", "c", "y")
            .with_submission("r1", "d", "z")
            .with_submission("r2", "a", "w")
            .with_vote("r1", "a", "x", 5)
            .with_vote("r1", "a", "y", 3)
            .with_vote("r1", "a", "z", 1)
            .with_vote("r1", "b", "y", 2)
            .with_vote("r1", "b", "z", 1)
            .with_vote("r1", "c", "x", 4)
            .with_vote("r1", "d", "x", 5)
            .with_vote("r1", "d", "y", 3)
            .with_vote("r1", "b", "x", 0)
            .with_vote("r2", "b", "w", 4)
            .with_vote("r2", "a", "w", 2)
            .with_track("x", "X", "Big", 90)
            .with_track("y", "Y", "Mid", 50)
            .with_track("z", "Z", "Tiny", 10)
    }

    // --- generosity / range ---

    #[test]
    fn generosity_ignores_zero_votes() {
        let l = league();
        let (mean, std) = generosity_score(&l, &id("b"), Some(&"r1".into()));
        assert!((mean - 1.5).abs() < 1e-12);
        assert!((std - 0.5).abs() < 1e-12);
    }

    #[test]
    fn generosity_of_silent_voter() {
        let l = league();
        assert_eq!(generosity_score(&l, &id("zz"), None), (0.0, 0.0));
    }

    #[test]
    fn voting_range_spans_nonzero_votes() {
        let l = league();
        assert_eq!(voting_range(&l, &id("a"), None), (1, 5, 4.0));
        assert_eq!(voting_range(&l, &id("zz"), None), (0, 0, 0.0));
    }

    // --- hipster ---

    #[test]
    fn hipster_weights_strong_votes_only() {
        let l = league();
        // a, r1: x(5, pop 90) and y(3, pop 50) qualify; z(1) does not.
        // (10*5 + 50*3) / 8 = 25
        let h = hipster_score(&l, &id("a"), Some(&"r1".into()));
        assert!((h - 25.0).abs() < 1e-12);
    }

    #[test]
    fn hipster_without_qualifying_votes_is_zero() {
        let l = League::new("h")
            .with_round("r1")
            .with_competitor("a", "A")
            .with_vote("r1", "a", "x", 1);
        assert_eq!(hipster_score(&l, &id("a"), None), 0.0);
    }

    #[test]
    fn hipster_treats_unknown_items_as_obscure() {
        let l = league();
        // a, r2: w is unresolved (popularity 0) -> 100.
        assert_eq!(hipster_score(&l, &id("a"), Some(&"r2".into())), 100.0);
    }

    // --- golden ear ---

    #[test]
    fn golden_ear_perfect_agreement() {
        let l = league();
        // a: x5 y3 z1; others: x=0+4+5=9, y=2+3=5, z=1 -> same order.
        let g = golden_ear_score(&l, &id("a"), Some(&"r1".into()));
        assert!((g - 1.0).abs() < 1e-12, "g = {g}");
    }

    #[test]
    fn golden_ear_needs_three_pairs() {
        let l = league();
        // b has only two cast votes in r1.
        assert_eq!(golden_ear_score(&l, &id("b"), Some(&"r1".into())), 0.0);
    }

    #[test]
    fn golden_ear_skips_items_without_other_voters() {
        let l = League::new("g")
            .with_round("r1")
            .with_competitor("a", "A")
            .with_competitor("b", "B")
            .with_vote("r1", "a", "x", 3)
            .with_vote("r1", "a", "y", 2)
            .with_vote("r1", "a", "z", 1)
            .with_vote("r1", "b", "x", 1)
            .with_vote("r1", "b", "y", 1);
        // Only x and y have other voters: two pairs -> 0.
        assert_eq!(golden_ear_score(&l, &id("a"), None), 0.0);
    }

    #[test]
    fn golden_ear_constant_group_is_zero_not_nan() {
        let l = League::new("g")
            .with_round("r1")
            .with_competitor("a", "A")
            .with_competitor("b", "B")
            .with_vote("r1", "a", "x", 3)
            .with_vote("r1", "a", "y", 2)
            .with_vote("r1", "a", "z", 1)
            .with_vote("r1", "b", "x", 2)
            .with_vote("r1", "b", "y", 2)
            .with_vote("r1", "b", "z", 2);
        assert_eq!(golden_ear_score(&l, &id("a"), None), 0.0);
    }

    // --- similarity ---

    #[test]
    fn similarity_diagonal_and_symmetry() {
        let l = league();
        let m = voter_similarity_matrix(&l, None);
        assert_eq!(m.len(), 4);
        for i in 0..m.len() {
            assert_eq!(m.values[i][i], 1.0);
            for j in 0..m.len() {
                assert_eq!(m.values[i][j], m.values[j][i]);
            }
        }
    }

    #[test]
    fn similarity_treats_missing_as_zero() {
        let l = League::new("s")
            .with_round("r1")
            .with_competitor("a", "A")
            .with_competitor("b", "B")
            .with_vote("r1", "a", "x", 3)
            .with_vote("r1", "a", "y", 1)
            .with_vote("r1", "b", "x", 2);
        // a: [3, 1], b: [2, 0] -> perfectly correlated.
        let m = voter_similarity_matrix(&l, None);
        assert!((m.get(&id("a"), &id("b")).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn similarity_ignores_items_neither_voter_touched() {
        // a and b rank x and y in opposite order; c and d only vote on z and w.
        let l = League::new("s")
            .with_round("r1")
            .with_competitor("a", "A")
            .with_competitor("b", "B")
            .with_competitor("c", "C")
            .with_competitor("d", "D")
            .with_vote("r1", "a", "x", 3)
            .with_vote("r1", "a", "y", 1)
            .with_vote("r1", "b", "x", 1)
            .with_vote("r1", "b", "y", 3)
            .with_vote("r1", "c", "z", 2)
            .with_vote("r1", "c", "w", 1)
            .with_vote("r1", "d", "z", 1)
            .with_vote("r1", "d", "w", 2);
        let m = voter_similarity_matrix(&l, None);
        assert!((m.get(&id("a"), &id("b")).unwrap() + 1.0).abs() < 1e-12);
        assert!((m.get(&id("c"), &id("d")).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn similarity_counts_zero_point_votes_in_the_union() {
        let l = League::new("s")
            .with_round("r1")
            .with_competitor("a", "A")
            .with_competitor("b", "B")
            .with_competitor("c", "C")
            .with_vote("r1", "a", "x", 2)
            .with_vote("r1", "a", "y", 0)
            .with_vote("r1", "b", "x", 1)
            .with_vote("r1", "c", "q", 4);
        // Pair (a, b) sees x and y: [2, 0] vs [1, 0]. c's q stays out.
        let m = voter_similarity_matrix(&l, None);
        assert!((m.get(&id("a"), &id("b")).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn similarity_undefined_pairs_are_zero() {
        let l = League::new("s")
            .with_round("r1")
            .with_competitor("a", "A")
            .with_competitor("b", "B")
            .with_competitor("c", "C")
            .with_vote("r1", "a", "x", 3)
            .with_vote("r1", "b", "x", 2);
        // One item only: every vector is constant.
        let m = voter_similarity_matrix(&l, None);
        assert_eq!(m.get(&id("a"), &id("b")), Some(0.0));
        assert_eq!(m.get(&id("c"), &id("c")), Some(1.0));
        assert_eq!(m.mean_off_diagonal(), 0.0);
    }

    #[test]
    fn similarity_of_empty_league() {
        let m = voter_similarity_matrix(&League::new("e"), None);
        assert!(m.is_empty());
        assert_eq!(m.mean_off_diagonal(), 0.0);
    }

    // --- loyalty ---

    #[test]
    fn loyalty_excludes_self_and_zero_votes() {
        let l = league();
        let loyalty = loyalty_index(&l, &id("b"), None);
        // b: y->c 2, z->d 1, x 0 (ignored), w->a 4
        assert_eq!(loyalty.get(&id("c")), Some(&2.0));
        assert_eq!(loyalty.get(&id("d")), Some(&1.0));
        assert_eq!(loyalty.get(&id("a")), Some(&4.0));
        assert!(!loyalty.contains_key(&id("b")));
    }

    #[test]
    fn loyalty_self_vote_dropped() {
        let l = League::new("self")
            .with_round("r1")
            .with_competitor("a", "A")
            .with_submission("r1", "a", "x")
            .with_vote("r1", "a", "x", 5);
        assert!(loyalty_index(&l, &id("a"), None).is_empty());
    }

    // --- all_voter_metrics ---

    #[test]
    fn all_voter_metrics_one_row_per_competitor() {
        let l = league();
        let rows = all_voter_metrics(&l, None);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].voter_id, id("a"));
        assert_eq!(rows[0].num_votes, 4);
        assert_eq!(rows[1].num_votes, 3);
    }

    // --- proptest ---

    fn arb_league() -> impl Strategy<Value = League> {
        let voters = ["a", "b", "c", "d"];
        prop::collection::vec((0usize..4, 0usize..6, 0u32..6), 0..40).prop_map(move |votes| {
            let mut l = League::new("arb").with_round("r1");
            for v in voters {
                l = l.with_competitor(v, v.to_uppercase());
            }
            for (voter, item, points) in votes {
                l = l.with_vote("r1", voters[voter], format!("item{item}").as_str(), points);
            }
            l
        })
    }

    proptest! {
        #[test]
        fn similarity_symmetric_unit_diagonal(l in arb_league()) {
            let m = voter_similarity_matrix(&l, None);
            for i in 0..m.len() {
                prop_assert_eq!(m.values[i][i], 1.0);
                for j in 0..m.len() {
                    prop_assert_eq!(m.values[i][j], m.values[j][i]);
                    prop_assert!((-1.0..=1.0).contains(&m.values[i][j]));
                }
            }
        }

        #[test]
        fn golden_ear_bounded(l in arb_league()) {
            for c in &l.competitors {
                let g = golden_ear_score(&l, &c.id, None);
                prop_assert!(g.is_finite() && (-1.0..=1.0).contains(&g));
            }
        }

        #[test]
        fn hipster_within_scale(l in arb_league()) {
            for c in &l.competitors {
                let h = hipster_score(&l, &c.id, None);
                prop_assert!((0.0..=100.0).contains(&h));
            }
        }
    }
}
