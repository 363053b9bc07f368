//! Shared fixture leagues for integration and property tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use setlist_core::{CompetitorId, League};

/// Shorthand for a competitor id.
pub fn cid(id: &str) -> CompetitorId {
    CompetitorId::from(id)
}

/// Four competitors over three rounds; `dan` skips round two.
///
/// Submission totals per round:
///
/// | round | alice | bob | cara | dan |
/// |-------|-------|-----|------|-----|
/// | r1    | 7     | 6   | 3    | 0   |
/// | r2    | 4     | 8   | 5    | -   |
/// | r3    | 10    | 3   | 1    | 4   |
///
/// Item popularity is 80 for alice, 20 for bob, 50 for cara, 10 for dan.
pub fn sample_league() -> League {
    let mut league = League::new("sample")
        .with_round("r1")
        .with_round("r2")
        .with_round("r3")
        .with_competitor("alice", "Alice")
        .with_competitor("bob", "Bob")
        .with_competitor("cara", "Cara")
        .with_competitor("dan", "Dan")
        .with_submission_comment("r1", "alice", "a1", "an old favourite")
        .with_submission("r1", "bob", "b1")
        .with_submission("r1", "cara", "c1")
        .with_submission("r1", "dan", "d1")
        .with_submission("r2", "alice", "a2")
        .with_submission_comment("r2", "bob", "b2", "found this on a late night drive")
        .with_submission("r2", "cara", "c2")
        .with_submission("r3", "alice", "a3")
        .with_submission("r3", "bob", "b3")
        .with_submission("r3", "cara", "c3")
        .with_submission("r3", "dan", "d3");

    let votes: [(&str, &str, &str, u32); 30] = [
        ("r1", "alice", "b1", 3),
        ("r1", "alice", "c1", 1),
        ("r1", "alice", "d1", 0),
        ("r1", "bob", "a1", 4),
        ("r1", "bob", "c1", 0),
        ("r1", "bob", "d1", 0),
        ("r1", "cara", "a1", 2),
        ("r1", "cara", "b1", 2),
        ("r1", "cara", "d1", 0),
        ("r1", "dan", "a1", 1),
        ("r1", "dan", "b1", 1),
        ("r1", "dan", "c1", 2),
        ("r2", "alice", "b2", 2),
        ("r2", "alice", "c2", 3),
        ("r2", "bob", "a2", 1),
        ("r2", "bob", "c2", 2),
        ("r2", "cara", "a2", 1),
        ("r2", "cara", "b2", 5),
        ("r2", "dan", "a2", 2),
        ("r2", "dan", "b2", 1),
        ("r2", "dan", "c2", 0),
        ("r3", "alice", "b3", 1),
        ("r3", "alice", "c3", 1),
        ("r3", "alice", "d3", 2),
        ("r3", "bob", "a3", 5),
        ("r3", "bob", "d3", 1),
        ("r3", "cara", "a3", 3),
        ("r3", "cara", "d3", 1),
        ("r3", "dan", "a3", 2),
        ("r3", "dan", "b3", 2),
    ];
    for (round, voter, item, points) in votes {
        league = league.with_vote(round, voter, item, points);
    }

    for (prefix, popularity) in [("a", 80), ("b", 20), ("c", 50), ("d", 10)] {
        for n in 1..=3 {
            let item = format!("{prefix}{n}");
            league = league.with_track(item.clone(), format!("Song {item}"), format!("Artist {prefix}"), popularity);
        }
    }
    league.with_vote_comment(
        "r3",
        "bob",
        "c3",
        0,
        "not for me this time, but the production on this one is genuinely lovely",
    )
}

/// One submitter per row, scoring exactly the given totals round by round.
///
/// Rounds are `r0..rN`. A `judge` competitor with no submissions of its own
/// awards each total as a single vote.
pub fn scored_league(rows: &[(&str, &[u32])]) -> League {
    let rounds = rows.iter().map(|(_, totals)| totals.len()).max().unwrap_or(0);
    let mut league = League::new("scored").with_competitor("judge", "Judge");
    for r in 0..rounds {
        league = league.with_round(format!("r{r}"));
    }
    for (id, totals) in rows {
        league = league.with_competitor(*id, format!("Player {id}"));
        for (r, &points) in totals.iter().enumerate() {
            let item = format!("{id}-r{r}");
            league = league
                .with_submission(format!("r{r}"), *id, item.clone())
                .with_vote(format!("r{r}"), "judge", item, points);
        }
    }
    league
}

/// A league where every competitor submits in every round and votes a
/// random `0..=max_points` on every other submission.
pub fn random_league(rounds: usize, competitors: usize, max_points: u32, seed: u64) -> League {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut league = League::new(format!("random-{seed}"));
    for c in 0..competitors {
        league = league.with_competitor(format!("c{c}"), format!("Player {c}"));
    }
    for r in 0..rounds {
        league = league.with_round(format!("r{r}"));
        for c in 0..competitors {
            let item = format!("r{r}-c{c}");
            let popularity = rng.gen_range(0..=100);
            league = league
                .with_submission(format!("r{r}"), format!("c{c}"), item.clone())
                .with_track(item, format!("Song {r}.{c}"), format!("Artist {c}"), popularity);
        }
        for voter in 0..competitors {
            for c in (0..competitors).filter(|&c| c != voter) {
                let points = rng.gen_range(0..=max_points);
                league = league.with_vote(format!("r{r}"), format!("c{voter}"), format!("r{r}-c{c}"), points);
            }
        }
    }
    league
}
