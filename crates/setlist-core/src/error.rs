//! Error types for Setlist.
//!
//! Metric computations never fail; these cover loading, validating and
//! fingerprinting a league snapshot.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
    #[error("duplicate round id: {0}")] DuplicateRound(String),
    #[error("duplicate competitor id: {0}")] DuplicateCompetitor(String),
    #[error("popularity out of range for {item}: {popularity} > 100")] PopularityOutOfRange { item: String, popularity: u8 },
    #[error("encoding: {0}")] Encoding(String),
    #[error("malformed snapshot: {0}")] Malformed(String),
}

#[derive(Error, Debug)]
pub enum SetlistError {
    #[error(transparent)] Dataset(#[from] DatasetError),
    #[error("io: {0}")] Io(String),
}

impl From<std::io::Error> for SetlistError {
    fn from(e: std::io::Error) -> Self {
        SetlistError::Io(e.to_string())
    }
}
