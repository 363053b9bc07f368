//! # setlist-metrics: league metrics engine.
//!
//! Pure, read-only computations over a [`Dataset`](setlist_core::Dataset)
//! snapshot. Nothing here performs I/O or fails: sparse data degrades to a
//! neutral value (`0.0`, an empty table, a uniform distribution).
//!
//! - **Songs**: total points, controversy, obscurity, vote histograms.
//! - **Voters**: generosity, hipster score, golden ear, similarity, loyalty.
//! - **Submitters**: average, consistency, underdog factor, fan and nemesis.
//! - **Network**: weighted voting graph, influence (rank propagation),
//!   reciprocity, voting blocs.
//! - **Trends**: round rankings, cumulative points, momentum, streaks,
//!   finishing strength, peaks and best stretches.
//! - **Arcs**: one narrative category per active submitter.
//! - **Comments**, **summary** and **report** build on the families above.
//!
//! All per-competitor structures are keyed by [`CompetitorId`](setlist_core::CompetitorId);
//! display names only appear in output records.

pub mod arcs;
pub mod comments;
pub mod config;
pub mod network;
pub mod report;
pub mod songs;
pub mod submitters;
pub mod summary;
pub mod trends;
pub mod voters;

pub use arcs::{ArcProfile, ArcType, LeagueContext};
pub use config::{MetricsConfig, RankConfig};
pub use network::VotingGraph;
pub use report::LeagueReport;
pub use songs::SongRecord;
pub use submitters::{FanAndNemesis, SubmitterRecord, VoterAffinity};
pub use trends::{MomentumRecord, MomentumTrend, RoundRanking, StreakInfo};
pub use voters::VoterRecord;
