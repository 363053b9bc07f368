//! Comment metrics on submissions and votes.
//!
//! A comment counts only if it has non-whitespace content; its length is
//! the number of characters after trimming.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use setlist_core::constants::COMMENT_CORRELATION_MIN_SAMPLES;
use setlist_core::stats;
use setlist_core::traits::round_matches;
use setlist_core::{CompetitorId, Dataset, ItemId, RoundId};

use crate::songs::total_points;

fn comment_length(comment: &str) -> Option<usize> {
    let trimmed = comment.trim();
    (!trimmed.is_empty()).then(|| trimmed.chars().count())
}

/// `(average length of present comments, percent of entries with one)`.
fn engagement<'a>(comments: impl Iterator<Item = &'a str>) -> (f64, f64, usize, usize) {
    let mut entries = 0;
    let mut lengths = Vec::new();
    for c in comments {
        entries += 1;
        lengths.extend(comment_length(c));
    }
    if lengths.is_empty() {
        return (0.0, 0.0, 0, entries);
    }
    let rate = lengths.len() as f64 / entries as f64 * 100.0;
    (stats::mean(&lengths), rate, lengths.len(), entries)
}

/// `(average comment length, comment rate %)` over a submitter's submissions.
pub fn submitter_wordsmith_score(
    ds: &dyn Dataset,
    submitter: &CompetitorId,
    round: Option<&RoundId>,
) -> (f64, f64) {
    let (avg, rate, _, _) = engagement(
        ds.submissions_by(submitter, round)
            .into_iter()
            .map(|s| s.comment.as_str()),
    );
    (avg, rate)
}

fn cast_vote_comments<'a>(
    ds: &'a dyn Dataset,
    voter: &'a CompetitorId,
    round: Option<&'a RoundId>,
) -> impl Iterator<Item = &'a str> + 'a {
    ds.votes()
        .iter()
        .filter(move |v| &v.voter_id == voter && v.is_cast() && round_matches(round, &v.round_id))
        .map(|v| v.comment.as_str())
}

/// `(average comment length, comment rate %)` over a voter's nonzero votes.
pub fn voter_critic_score(ds: &dyn Dataset, voter: &CompetitorId, round: Option<&RoundId>) -> (f64, f64) {
    let (avg, rate, _, _) = engagement(cast_vote_comments(ds, voter, round));
    (avg, rate)
}

/// `(number of vote comments, their average length)` on an item.
pub fn song_discussion_score(ds: &dyn Dataset, item: &ItemId, round: Option<&RoundId>) -> (usize, f64) {
    let lengths: Vec<usize> = ds
        .votes()
        .iter()
        .filter(|v| &v.item_id == item && round_matches(round, &v.round_id))
        .filter_map(|v| comment_length(&v.comment))
        .collect();
    (lengths.len(), stats::mean(&lengths))
}

/// Comment habits of one competitor, as a submitter or as a voter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentStats {
    pub competitor_id: CompetitorId,
    pub name: String,
    pub avg_length: f64,
    pub comment_rate: f64,
    pub total_comments: usize,
    /// Submissions or nonzero votes considered.
    pub total_entries: usize,
}

fn sorted_by_length(mut rows: Vec<CommentStats>) -> Vec<CommentStats> {
    rows.sort_by_key(|r| std::cmp::Reverse(OrderedFloat(r.avg_length)));
    rows
}

/// Submission-comment stats for every competitor, longest average first.
pub fn all_submitter_comment_stats(ds: &dyn Dataset) -> Vec<CommentStats> {
    let rows = ds
        .competitors()
        .iter()
        .map(|c| {
            let (avg_length, comment_rate, total_comments, total_entries) =
                engagement(ds.submissions_by(&c.id, None).into_iter().map(|s| s.comment.as_str()));
            CommentStats {
                competitor_id: c.id.clone(),
                name: c.name.clone(),
                avg_length,
                comment_rate,
                total_comments,
                total_entries,
            }
        })
        .collect();
    sorted_by_length(rows)
}

/// Vote-comment stats for every competitor, longest average first.
pub fn all_voter_comment_stats(ds: &dyn Dataset) -> Vec<CommentStats> {
    let rows = ds
        .competitors()
        .iter()
        .map(|c| {
            let (avg_length, comment_rate, total_comments, total_entries) =
                engagement(cast_vote_comments(ds, &c.id, None));
            CommentStats {
                competitor_id: c.id.clone(),
                name: c.name.clone(),
                avg_length,
                comment_rate,
                total_comments,
                total_entries,
            }
        })
        .collect();
    sorted_by_length(rows)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentKind {
    Submission,
    Vote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotableComment {
    pub kind: CommentKind,
    pub person_id: CompetitorId,
    pub person: String,
    pub item_id: ItemId,
    pub song: String,
    pub artist: String,
    pub round_id: RoundId,
    /// Trimmed text.
    pub comment: String,
    pub length: usize,
    /// Points of the vote the comment came with; `None` for submissions.
    pub points: Option<u32>,
}

/// The `top_n` longest comments of at least `min_length` characters.
/// Submission comments precede vote comments of equal length.
pub fn notable_comments(ds: &dyn Dataset, min_length: usize, top_n: usize) -> Vec<NotableComment> {
    let notable = |kind, person: &CompetitorId, item: &ItemId, round: &RoundId, text: &str, points| {
        let length = comment_length(text).filter(|&n| n >= min_length)?;
        let info = ds.track_info(item);
        Some(NotableComment {
            kind,
            person_id: person.clone(),
            person: ds.competitor_name(person).to_string(),
            item_id: item.clone(),
            song: info.name,
            artist: info.artist,
            round_id: round.clone(),
            comment: text.trim().to_string(),
            length,
            points,
        })
    };

    let mut rows: Vec<NotableComment> = ds
        .submissions()
        .iter()
        .filter_map(|s| {
            notable(CommentKind::Submission, &s.submitter_id, &s.item_id, &s.round_id, &s.comment, None)
        })
        .chain(ds.votes().iter().filter_map(|v| {
            notable(CommentKind::Vote, &v.voter_id, &v.item_id, &v.round_id, &v.comment, Some(v.points))
        }))
        .collect();
    rows.sort_by(|a, b| b.length.cmp(&a.length));
    rows.truncate(top_n);
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointEngagement {
    pub points: u32,
    pub avg_comment_length: f64,
    pub comment_rate: f64,
    /// Nonzero votes with this point value.
    pub count: usize,
}

/// Vote-comment engagement grouped by point value, ascending.
pub fn comment_engagement_by_points(ds: &dyn Dataset) -> Vec<PointEngagement> {
    let mut groups: BTreeMap<u32, Vec<&str>> = BTreeMap::new();
    for v in ds.votes().iter().filter(|v| v.is_cast()) {
        groups.entry(v.points).or_default().push(v.comment.as_str());
    }
    groups
        .into_iter()
        .map(|(points, comments)| {
            let (avg_comment_length, comment_rate, _, count) = engagement(comments.into_iter());
            PointEngagement {
                points,
                avg_comment_length,
                comment_rate,
                count,
            }
        })
        .collect()
}

/// One submission with its comment length and the points it earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionCommentPoints {
    pub item_id: ItemId,
    pub round_id: RoundId,
    pub submitter_id: CompetitorId,
    pub submitter_name: String,
    pub song: String,
    /// Trimmed length; `0` when there is no comment.
    pub comment_length: usize,
    pub has_comment: bool,
    pub total_points: u64,
}

/// Comment length against points for every submission, in submission order.
pub fn submission_comment_vs_points(ds: &dyn Dataset) -> Vec<SubmissionCommentPoints> {
    ds.submissions()
        .iter()
        .map(|s| {
            let length = comment_length(&s.comment);
            SubmissionCommentPoints {
                item_id: s.item_id.clone(),
                round_id: s.round_id.clone(),
                submitter_id: s.submitter_id.clone(),
                submitter_name: ds.competitor_name(&s.submitter_id).to_string(),
                song: ds.track_info(&s.item_id).name,
                comment_length: length.unwrap_or(0),
                has_comment: length.is_some(),
                total_points: total_points(ds, &s.item_id, Some(&s.round_id)),
            }
        })
        .collect()
}

/// Whether explaining a submission pays off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentCorrelation {
    /// Pearson correlation of submission comment length against points.
    pub correlation: f64,
    pub avg_points_with_comment: f64,
    pub avg_points_without_comment: f64,
    pub difference: f64,
    pub pct_with_comment: f64,
}

/// All zeros with fewer than [`COMMENT_CORRELATION_MIN_SAMPLES`] submissions.
pub fn comment_length_correlation(ds: &dyn Dataset) -> CommentCorrelation {
    let samples: Vec<(usize, u64)> = submission_comment_vs_points(ds)
        .into_iter()
        .map(|row| (row.comment_length, row.total_points))
        .collect();
    if samples.len() < COMMENT_CORRELATION_MIN_SAMPLES {
        return CommentCorrelation::default();
    }

    let lengths: Vec<f64> = samples.iter().map(|&(l, _)| l as f64).collect();
    let points: Vec<f64> = samples.iter().map(|&(_, p)| p as f64).collect();
    let (with, without): (Vec<(usize, u64)>, Vec<(usize, u64)>) =
        samples.iter().partition(|&&(l, _)| l > 0);
    let avg_of = |rows: &[(usize, u64)]| stats::mean(&rows.iter().map(|&(_, p)| p).collect::<Vec<_>>());
    let avg_with = avg_of(&with);
    let avg_without = avg_of(&without);

    CommentCorrelation {
        correlation: stats::finite_or_zero(stats::pearson(&lengths, &points)),
        avg_points_with_comment: avg_with,
        avg_points_without_comment: avg_without,
        difference: avg_with - avg_without,
        pct_with_comment: with.len() as f64 / samples.len() as f64 * 100.0,
    }
}
