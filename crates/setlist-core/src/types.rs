//! Core league types: rounds, competitors, submissions, votes, track metadata.
//!
//! Everything here is owned by the dataset provider and treated as
//! read-only by the metrics engine. Points are non-negative integers;
//! a zero-point vote means the voter abstained on that item.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::UNKNOWN_NAME;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
            bincode::Encode, bincode::Decode,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Opaque round identifier. Rounds are ordered by their position in the league.
    RoundId
);

string_id!(
    /// Stable competitor identifier. Unlike display names, ids are unique.
    CompetitorId
);

string_id!(
    /// Identifier of a submitted item (a track URI in practice).
    ItemId
);

/// A league participant. Every competitor both submits and votes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct Competitor {
    pub id: CompetitorId,
    /// Display name. Not guaranteed unique across the league.
    pub name: String,
}

/// One item entered by one submitter into one round.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct Submission {
    pub round_id: RoundId,
    pub submitter_id: CompetitorId,
    pub item_id: ItemId,
    #[serde(default)]
    pub comment: String,
}

/// Points assigned by one voter to one item in one round.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct Vote {
    pub round_id: RoundId,
    pub voter_id: CompetitorId,
    pub item_id: ItemId,
    /// `0` means not voted / abstained.
    pub points: u32,
    #[serde(default)]
    pub comment: String,
}

impl Vote {
    /// Whether this vote carries any points.
    pub fn is_cast(&self) -> bool {
        self.points > 0
    }
}

/// Metadata resolved for an item by the external track lookup.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct TrackInfo {
    pub name: String,
    pub artist: String,
    /// Popularity on the external 0–100 scale.
    #[serde(default)]
    pub popularity: u8,
    #[serde(default)]
    pub release_date: Option<String>,
}

impl TrackInfo {
    /// Metadata reported for items the lookup cannot resolve.
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN_NAME.to_string(),
            artist: UNKNOWN_NAME.to_string(),
            popularity: 0,
            release_date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_as_raw_string() {
        assert_eq!(RoundId::from("round-1").to_string(), "round-1");
        assert_eq!(CompetitorId::new("abc").as_str(), "abc");
        assert_eq!(ItemId::from(String::from("spotify:track:1")).0, "spotify:track:1");
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&CompetitorId::from("c1")).unwrap();
        assert_eq!(json, "\"c1\"");
        let back: RoundId = serde_json::from_str("\"r7\"").unwrap();
        assert_eq!(back, RoundId::from("r7"));
    }

    #[test]
    fn vote_comment_defaults_to_empty() {
        let vote: Vote = serde_json::from_str(
            r#"{"round_id":"r1","voter_id":"a","item_id":"x","points":3}"#,
        )
        .unwrap();
        assert_eq!(vote.comment, "");
        assert!(vote.is_cast());
    }

    #[test]
    fn zero_point_vote_is_not_cast() {
        let vote = Vote {
            round_id: "r1".into(),
            voter_id: "a".into(),
            item_id: "x".into(),
            points: 0,
            comment: String::new(),
        };
        assert!(!vote.is_cast());
    }

    #[test]
    fn unknown_track_placeholder() {
        let t = TrackInfo::unknown();
        assert_eq!(t.name, UNKNOWN_NAME);
        assert_eq!(t.artist, UNKNOWN_NAME);
        assert_eq!(t.popularity, 0);
        assert!(t.release_date.is_none());
    }

    #[test]
    fn ids_order_lexicographically() {
        let mut ids = vec![ItemId::from("b"), ItemId::from("a"), ItemId::from("c")];
        ids.sort();
        assert_eq!(ids, vec![ItemId::from("a"), ItemId::from("b"), ItemId::from("c")]);
    }
}
