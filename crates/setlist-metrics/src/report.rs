//! A single serializable bundle of every metric table for one league.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::info;

use setlist_core::{CompetitorId, Dataset};

use crate::arcs::{ArcProfile, all_player_arcs};
use crate::comments::{
    CommentCorrelation, CommentStats, NotableComment, PointEngagement, SubmissionCommentPoints,
    all_submitter_comment_stats, all_voter_comment_stats, comment_engagement_by_points,
    comment_length_correlation, notable_comments, submission_comment_vs_points,
};
use crate::config::MetricsConfig;
use crate::network::{ReciprocityRecord, build_voting_graph, voting_blocs, voting_reciprocity};
use crate::songs::{SongRecord, all_song_metrics};
use crate::submitters::{SubmitterRecord, all_submitter_metrics};
use crate::summary::{LeagueSummary, league_summary};
use crate::trends::{MomentumRecord, RoundRanking, all_momentum_scores, round_rankings};
use crate::voters::{SimilarityMatrix, VoterRecord, all_voter_metrics, voter_similarity_matrix};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceRecord {
    pub competitor_id: CompetitorId,
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkReport {
    pub num_nodes: usize,
    pub num_edges: usize,
    /// Highest influence first.
    pub influence: Vec<InfluenceRecord>,
    pub reciprocity: Vec<ReciprocityRecord>,
    pub blocs: BTreeMap<CompetitorId, usize>,
    pub similarity: SimilarityMatrix,
}

impl NetworkReport {
    pub fn build(ds: &dyn Dataset, config: &MetricsConfig) -> Self {
        let graph = build_voting_graph(ds, None);
        let mut influence: Vec<InfluenceRecord> = graph
            .nodes()
            .iter()
            .zip(graph.rank(&config.rank_config()))
            .map(|(id, score)| InfluenceRecord {
                competitor_id: id.clone(),
                name: ds.competitor_name(id).to_string(),
                score,
            })
            .collect();
        influence.sort_by_key(|r| std::cmp::Reverse(OrderedFloat(r.score)));

        Self {
            num_nodes: graph.node_count(),
            num_edges: graph.edge_count(),
            influence,
            reciprocity: voting_reciprocity(ds, None),
            blocs: voting_blocs(ds, None),
            similarity: voter_similarity_matrix(ds, None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentReport {
    pub submitters: Vec<CommentStats>,
    pub voters: Vec<CommentStats>,
    pub notable: Vec<NotableComment>,
    pub engagement_by_points: Vec<PointEngagement>,
    pub length_correlation: CommentCorrelation,
    pub by_submission: Vec<SubmissionCommentPoints>,
}

impl CommentReport {
    pub fn build(ds: &dyn Dataset, config: &MetricsConfig) -> Self {
        Self {
            submitters: all_submitter_comment_stats(ds),
            voters: all_voter_comment_stats(ds),
            notable: notable_comments(ds, config.notable_min_length, config.notable_top_n),
            engagement_by_points: comment_engagement_by_points(ds),
            length_correlation: comment_length_correlation(ds),
            by_submission: submission_comment_vs_points(ds),
        }
    }
}

/// Every table the engine produces, computed over the whole league.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueReport {
    pub summary: LeagueSummary,
    pub songs: Vec<SongRecord>,
    pub voters: Vec<VoterRecord>,
    pub submitters: Vec<SubmitterRecord>,
    pub network: NetworkReport,
    pub rankings: Vec<RoundRanking>,
    pub momentum: Vec<MomentumRecord>,
    pub arcs: Vec<ArcProfile>,
    pub comments: CommentReport,
}

impl LeagueReport {
    pub fn build(ds: &dyn Dataset, config: &MetricsConfig) -> Self {
        let report = Self {
            summary: league_summary(ds),
            songs: all_song_metrics(ds, None),
            voters: all_voter_metrics(ds, None),
            submitters: all_submitter_metrics(ds, None),
            network: NetworkReport::build(ds, config),
            rankings: round_rankings(ds),
            momentum: all_momentum_scores(ds, config.top_n),
            arcs: all_player_arcs(ds, config.stretch_window),
            comments: CommentReport::build(ds, config),
        };
        info!(
            songs = report.songs.len(),
            voters = report.voters.len(),
            arcs = report.arcs.len(),
            nodes = report.network.num_nodes,
            "report: league report built"
        );
        report
    }
}
