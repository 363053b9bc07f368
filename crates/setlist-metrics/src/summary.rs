//! League-level summary and comparisons across several leagues.
//!
//! Cross-league functions take `(name, dataset)` pairs; competitors and
//! items are matched across leagues by id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use setlist_core::stats;
use setlist_core::{CompetitorId, Dataset, ItemId};

use crate::songs::all_song_metrics;
use crate::submitters::{consistency_score, underdog_factor};
use crate::trends::round_competitiveness;
use crate::voters::{generosity_score, golden_ear_score, hipster_score, voter_similarity_matrix};

/// Headline numbers for one league.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueSummary {
    pub num_rounds: usize,
    pub num_competitors: usize,
    pub total_songs: usize,
    /// Votes carrying at least one point.
    pub total_votes: usize,
    pub total_points: u64,
    pub avg_points: f64,
    pub avg_controversy: f64,
    pub avg_obscurity: f64,
    pub avg_popularity: f64,
    /// Mean off-diagonal voter similarity.
    pub avg_voter_similarity: f64,
    /// Mean per-round std dev of song scores.
    pub avg_competitiveness: f64,
}

pub fn league_summary(ds: &dyn Dataset) -> LeagueSummary {
    let songs = all_song_metrics(ds, None);
    let points: Vec<u64> = songs.iter().map(|s| s.total_points).collect();
    let controversy: Vec<f64> = songs.iter().map(|s| s.controversy).collect();
    let obscurity: Vec<f64> = songs.iter().map(|s| s.obscurity).collect();
    let popularity: Vec<u8> = songs.iter().map(|s| s.popularity).collect();
    let competitiveness: Vec<f64> = ds
        .rounds()
        .iter()
        .map(|r| round_competitiveness(ds, r).score_std)
        .collect();

    LeagueSummary {
        num_rounds: ds.rounds().len(),
        num_competitors: ds.competitors().len(),
        total_songs: songs.len(),
        total_votes: ds.votes().iter().filter(|v| v.is_cast()).count(),
        total_points: points.iter().sum(),
        avg_points: stats::mean(&points),
        avg_controversy: stats::mean(&controversy),
        avg_obscurity: stats::mean(&obscurity),
        avg_popularity: stats::mean(&popularity),
        avg_voter_similarity: voter_similarity_matrix(ds, None).mean_off_diagonal(),
        avg_competitiveness: stats::mean(&competitiveness),
    }
}

/// Competitors in order of first appearance across the leagues.
fn competitors_across(leagues: &[(&str, &dyn Dataset)]) -> Vec<(CompetitorId, String)> {
    let mut seen = Vec::new();
    for (_, ds) in leagues {
        for c in ds.competitors() {
            if !seen.iter().any(|(id, _): &(CompetitorId, String)| id == &c.id) {
                seen.push((c.id.clone(), c.name.clone()));
            }
        }
    }
    seen
}

/// A submitter's numbers in one league.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitterLeagueStats {
    pub league: String,
    /// Whether the competitor took part; numbers are zero otherwise.
    pub present: bool,
    pub avg_points: f64,
    pub std_dev: f64,
    pub underdog: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitterComparison {
    pub submitter_id: CompetitorId,
    pub name: String,
    /// One entry per league, in the order given.
    pub leagues: Vec<SubmitterLeagueStats>,
    /// Average in the last league minus average in the first; `None`
    /// when fewer than two leagues are compared.
    pub change: Option<f64>,
}

impl SubmitterComparison {
    pub fn improved(&self) -> Option<bool> {
        self.change.map(|c| c > 0.0)
    }
}

pub fn compare_submitters(leagues: &[(&str, &dyn Dataset)]) -> Vec<SubmitterComparison> {
    let rows: Vec<SubmitterComparison> = competitors_across(leagues)
        .into_iter()
        .map(|(id, name)| {
            let per_league: Vec<SubmitterLeagueStats> = leagues
                .iter()
                .map(|&(league, ds)| {
                    let present = ds.competitor(&id).is_some();
                    let (avg_points, std_dev) = if present { consistency_score(ds, &id, None) } else { (0.0, 0.0) };
                    SubmitterLeagueStats {
                        league: league.to_string(),
                        present,
                        avg_points,
                        std_dev,
                        underdog: if present { underdog_factor(ds, &id, None) } else { 0.0 },
                    }
                })
                .collect();
            let change = match (per_league.first(), per_league.last()) {
                (Some(first), Some(last)) if per_league.len() >= 2 => Some(last.avg_points - first.avg_points),
                _ => None,
            };
            SubmitterComparison {
                submitter_id: id,
                name,
                leagues: per_league,
                change,
            }
        })
        .collect();
    debug!(leagues = leagues.len(), submitters = rows.len(), "summary: submitters compared");
    rows
}

/// A voter's numbers in one league.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoterLeagueStats {
    pub league: String,
    pub present: bool,
    pub golden_ear: f64,
    pub hipster: f64,
    pub generosity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoterComparison {
    pub voter_id: CompetitorId,
    pub name: String,
    pub leagues: Vec<VoterLeagueStats>,
}

pub fn compare_voters(leagues: &[(&str, &dyn Dataset)]) -> Vec<VoterComparison> {
    competitors_across(leagues)
        .into_iter()
        .map(|(id, name)| VoterComparison {
            leagues: leagues
                .iter()
                .map(|&(league, ds)| {
                    if ds.competitor(&id).is_none() {
                        return VoterLeagueStats {
                            league: league.to_string(),
                            present: false,
                            golden_ear: 0.0,
                            hipster: 0.0,
                            generosity: 0.0,
                        };
                    }
                    VoterLeagueStats {
                        league: league.to_string(),
                        present: true,
                        golden_ear: golden_ear_score(ds, &id, None),
                        hipster: hipster_score(ds, &id, None),
                        generosity: generosity_score(ds, &id, None).0,
                    }
                })
                .collect(),
            voter_id: id,
            name,
        })
        .collect()
}

/// How an item fared in one league.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongAppearance {
    pub league: String,
    pub total_points: u64,
    pub controversy: f64,
    pub submitter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongOverlap {
    pub item_id: ItemId,
    pub song: String,
    pub artist: String,
    pub num_leagues: usize,
    pub appearances: Vec<SongAppearance>,
}

/// Items submitted in two or more of the leagues, most widespread first.
///
/// When an item was submitted more than once within a league, its
/// highest-scoring submission represents that league.
pub fn song_overlap(leagues: &[(&str, &dyn Dataset)]) -> Vec<SongOverlap> {
    let mut order: Vec<ItemId> = Vec::new();
    let mut by_item: HashMap<ItemId, SongOverlap> = HashMap::new();

    for &(league, ds) in leagues {
        for song in all_song_metrics(ds, None) {
            let entry = by_item.entry(song.item_id.clone()).or_insert_with(|| {
                order.push(song.item_id.clone());
                SongOverlap {
                    item_id: song.item_id.clone(),
                    song: song.name.clone(),
                    artist: song.artist.clone(),
                    num_leagues: 0,
                    appearances: Vec::new(),
                }
            });
            if entry.appearances.iter().any(|a| a.league == league) {
                continue;
            }
            entry.num_leagues += 1;
            entry.appearances.push(SongAppearance {
                league: league.to_string(),
                total_points: song.total_points,
                controversy: song.controversy,
                submitter: song.submitter_name,
            });
        }
    }

    let mut rows: Vec<SongOverlap> = order
        .into_iter()
        .filter_map(|item| by_item.remove(&item))
        .filter(|o| o.num_leagues >= 2)
        .collect();
    rows.sort_by(|a, b| b.num_leagues.cmp(&a.num_leagues));
    rows
}
