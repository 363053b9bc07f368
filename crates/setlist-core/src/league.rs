//! In-memory league snapshot implementing [`Dataset`].
//!
//! A [`League`] is what the dataset provider hands to the engine: rounds in
//! competition order, competitors, submissions, votes, and a pre-fetched
//! [`TrackTable`] standing in for the external music service. Snapshots
//! are plain serde data and round-trip through JSON.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::MAX_POPULARITY;
use crate::error::{DatasetError, SetlistError};
use crate::traits::{Dataset, TrackLookup};
use crate::types::{Competitor, CompetitorId, ItemId, RoundId, Submission, TrackInfo, Vote};

/// Pre-fetched item metadata keyed by item id.
#[derive(
    Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, bincode::Encode, bincode::Decode,
)]
#[serde(transparent)]
pub struct TrackTable(pub BTreeMap<ItemId, TrackInfo>);

impl TrackTable {
    pub fn insert(&mut self, item: ItemId, info: TrackInfo) {
        self.0.insert(item, info);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TrackLookup for TrackTable {
    fn track(&self, item: &ItemId) -> Option<TrackInfo> {
        self.0.get(item).cloned()
    }
}

/// An immutable league snapshot.
#[derive(
    Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, bincode::Encode, bincode::Decode,
)]
pub struct League {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rounds: Vec<RoundId>,
    #[serde(default)]
    pub competitors: Vec<Competitor>,
    #[serde(default)]
    pub submissions: Vec<Submission>,
    #[serde(default)]
    pub votes: Vec<Vote>,
    #[serde(default)]
    pub tracks: TrackTable,
}

impl League {
    /// Create an empty league.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_round(mut self, round: impl Into<RoundId>) -> Self {
        self.rounds.push(round.into());
        self
    }

    pub fn with_competitor(mut self, id: impl Into<CompetitorId>, name: impl Into<String>) -> Self {
        self.competitors.push(Competitor {
            id: id.into(),
            name: name.into(),
        });
        self
    }

    pub fn with_submission(
        self,
        round: impl Into<RoundId>,
        submitter: impl Into<CompetitorId>,
        item: impl Into<ItemId>,
    ) -> Self {
        self.with_submission_comment(round, submitter, item, "")
    }

    pub fn with_submission_comment(
        mut self,
        round: impl Into<RoundId>,
        submitter: impl Into<CompetitorId>,
        item: impl Into<ItemId>,
        comment: impl Into<String>,
    ) -> Self {
        self.submissions.push(Submission {
            round_id: round.into(),
            submitter_id: submitter.into(),
            item_id: item.into(),
            comment: comment.into(),
        });
        self
    }

    pub fn with_vote(
        self,
        round: impl Into<RoundId>,
        voter: impl Into<CompetitorId>,
        item: impl Into<ItemId>,
        points: u32,
    ) -> Self {
        self.with_vote_comment(round, voter, item, points, "")
    }

    pub fn with_vote_comment(
        mut self,
        round: impl Into<RoundId>,
        voter: impl Into<CompetitorId>,
        item: impl Into<ItemId>,
        points: u32,
        comment: impl Into<String>,
    ) -> Self {
        self.votes.push(Vote {
            round_id: round.into(),
            voter_id: voter.into(),
            item_id: item.into(),
            points,
            comment: comment.into(),
        });
        self
    }

    pub fn with_track(
        mut self,
        item: impl Into<ItemId>,
        name: impl Into<String>,
        artist: impl Into<String>,
        popularity: u8,
    ) -> Self {
        self.tracks.insert(
            item.into(),
            TrackInfo {
                name: name.into(),
                artist: artist.into(),
                popularity,
                release_date: None,
            },
        );
        self
    }

    /// Check the snapshot invariants: unique round ids, unique competitor
    /// ids, popularity within 0–100.
    ///
    /// Dangling references (votes on items nobody submitted, unknown voters)
    /// are tolerated; the engine reports them under placeholder identities.
    pub fn validate(&self) -> Result<(), DatasetError> {
        let mut seen_rounds = HashSet::new();
        for round in &self.rounds {
            if !seen_rounds.insert(round) {
                return Err(DatasetError::DuplicateRound(round.to_string()));
            }
        }

        let mut seen_competitors = HashSet::new();
        for c in &self.competitors {
            if !seen_competitors.insert(&c.id) {
                return Err(DatasetError::DuplicateCompetitor(c.id.to_string()));
            }
        }

        for (item, info) in &self.tracks.0 {
            if info.popularity > MAX_POPULARITY {
                return Err(DatasetError::PopularityOutOfRange {
                    item: item.to_string(),
                    popularity: info.popularity,
                });
            }
        }

        let dangling = self
            .votes
            .iter()
            .filter(|v| self.submitter_for(&v.item_id, &v.round_id).is_none())
            .count();
        if dangling > 0 {
            warn!(dangling, league = %self.name, "league: votes reference items with no submission");
        }

        Ok(())
    }

    /// Parse and validate a JSON snapshot.
    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        let league: League =
            serde_json::from_str(json).map_err(|e| DatasetError::Malformed(e.to_string()))?;
        league.validate()?;
        debug!(
            league = %league.name,
            rounds = league.rounds.len(),
            competitors = league.competitors.len(),
            submissions = league.submissions.len(),
            votes = league.votes.len(),
            tracks = league.tracks.len(),
            "league: parsed snapshot"
        );
        Ok(league)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, DatasetError> {
        serde_json::to_string_pretty(self).map_err(|e| DatasetError::Encoding(e.to_string()))
    }

    /// Read and validate a JSON snapshot from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SetlistError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::from_json(&raw)?)
    }

    /// Write the snapshot to disk as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SetlistError> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }

    /// Content hash of the snapshot (BLAKE3 over the bincode encoding), hex encoded.
    ///
    /// Every metric is a pure function of the snapshot, so results may be
    /// cached under this key.
    pub fn fingerprint(&self) -> Result<String, DatasetError> {
        let encoded = bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| DatasetError::Encoding(e.to_string()))?;
        Ok(hex::encode(blake3::hash(&encoded).as_bytes()))
    }
}

impl Dataset for League {
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
