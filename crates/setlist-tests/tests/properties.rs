//! Property tests over randomly generated leagues.

use proptest::prelude::*;

use setlist_core::{Dataset, League};
use setlist_metrics::arcs::{ArcType, all_player_arcs, player_arc_type};
use setlist_metrics::network::{influence_score, voting_blocs, voting_reciprocity};
use setlist_metrics::songs::all_song_metrics;
use setlist_metrics::submitters::submission_totals;
use setlist_metrics::trends::{cumulative_points_by_round, finishing_strength, momentum_score, round_rankings};
use setlist_metrics::voters::{golden_ear_score, voter_similarity_matrix};
use setlist_tests::helpers::*;

fn arb_league() -> impl Strategy<Value = League> {
    (1usize..5, 2usize..6, 1u32..6, any::<u64>())
        .prop_map(|(rounds, competitors, max_points, seed)| random_league(rounds, competitors, max_points, seed))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn similarity_is_symmetric_with_unit_diagonal(league in arb_league()) {
        let m = voter_similarity_matrix(&league, None);
        for i in 0..m.len() {
            prop_assert_eq!(m.values[i][i], 1.0);
            for j in 0..m.len() {
                prop_assert_eq!(m.values[i][j], m.values[j][i]);
                prop_assert!(m.values[i][j].is_finite());
            }
        }
    }

    #[test]
    fn influence_is_a_distribution(league in arb_league()) {
        let scores = influence_score(&league, None);
        prop_assert_eq!(scores.len(), league.competitors().len());
        let total: f64 = scores.values().sum();
        prop_assert!((total - 1.0).abs() < 1e-6);
        prop_assert!(scores.values().all(|&s| s >= 0.0));
    }

    #[test]
    fn cumulative_ends_at_submission_total(league in arb_league()) {
        for c in league.competitors() {
            let cumulative = cumulative_points_by_round(&league, &c.id);
            prop_assert_eq!(cumulative.len(), league.rounds().len());
            let last = cumulative.last().map_or(0, |(_, p)| *p);
            let total: u64 = submission_totals(&league, &c.id, None).iter().sum();
            prop_assert_eq!(last, total);
            prop_assert!(cumulative.windows(2).all(|w| w[0].1 <= w[1].1));
        }
    }

    #[test]
    fn rankings_are_positional_per_round(league in arb_league()) {
        let rankings = round_rankings(&league);
        for round in league.rounds() {
            let in_round: Vec<_> = rankings.iter().filter(|r| &r.round_id == round).collect();
            let ranks: Vec<usize> = in_round.iter().map(|r| r.rank).collect();
            prop_assert_eq!(ranks, (1..=in_round.len()).collect::<Vec<_>>());
            prop_assert!(in_round.windows(2).all(|w| w[0].points >= w[1].points));
        }
    }

    #[test]
    fn song_table_sorted_and_bounded(league in arb_league()) {
        let songs = all_song_metrics(&league, None);
        prop_assert_eq!(songs.len(), league.submissions().len());
        prop_assert!(songs.windows(2).all(|w| w[0].total_points >= w[1].total_points));
        for s in &songs {
            prop_assert!(s.controversy >= 0.0);
            prop_assert!(s.obscurity <= s.total_points as f64);
        }
    }

    #[test]
    fn correlations_stay_in_range(league in arb_league()) {
        for c in league.competitors() {
            let g = golden_ear_score(&league, &c.id, None);
            prop_assert!(g.abs() <= 1.0 + 1e-9);
            prop_assert!(momentum_score(&league, &c.id).is_finite());
            prop_assert!(finishing_strength(&league, &c.id).is_finite());
        }
    }

    #[test]
    fn reciprocity_and_blocs_are_well_formed(league in arb_league()) {
        for r in voting_reciprocity(&league, None) {
            prop_assert!((0.0..=1.0).contains(&r.reciprocity));
            prop_assert_ne!(r.voter_id, r.submitter_id);
        }
        let blocs = voting_blocs(&league, None);
        prop_assert_eq!(blocs.len(), league.competitors().len());
        prop_assert!(blocs.values().all(|&b| b < league.competitors().len()));
    }

    #[test]
    fn every_active_submitter_gets_one_arc(league in arb_league()) {
        let arcs = all_player_arcs(&league, 3);
        prop_assert_eq!(arcs.len(), league.competitors().len());
        for a in &arcs {
            prop_assert!(ArcType::ALL.contains(&a.arc));
            prop_assert_eq!(player_arc_type(&league, &a.submitter_id), Some(a.arc));
        }
    }

    #[test]
    fn momentum_mirrors_under_reversal(totals in prop::collection::vec(0u32..20, 2..8)) {
        let reversed: Vec<u32> = totals.iter().rev().copied().collect();
        let forward = scored_league(&[("p", totals.as_slice())]);
        let backward = scored_league(&[("p", reversed.as_slice())]);
        let m1 = momentum_score(&forward, &cid("p"));
        let m2 = momentum_score(&backward, &cid("p"));
        prop_assert!((m1 + m2).abs() < 1e-9);
    }

    #[test]
    fn top_quartile_steady_submitter_is_headliner(base in 1u32..10, spread in 1u32..5) {
        // Three volatile low scorers and one steady high scorer.
        let star = [base + 20, base + 20, base + 20];
        let a = [base, base + spread * 2, base];
        let b = [base + spread * 3, base, base];
        let c = [base, base, base + spread * 4];
        let league = scored_league(&[("star", &star[..]), ("a", &a[..]), ("b", &b[..]), ("c", &c[..])]);
        prop_assert_eq!(player_arc_type(&league, &cid("star")), Some(ArcType::Headliner));
    }
}
