//! # setlist-core
//! Foundation types, the dataset contract, and shared statistics for Setlist.

pub mod constants;
pub mod error;
pub mod league;
pub mod stats;
pub mod traits;
pub mod types;

pub use error::{DatasetError, SetlistError};
pub use league::League;
pub use traits::{Dataset, TrackLookup};
pub use types::{Competitor, CompetitorId, ItemId, RoundId, Submission, TrackInfo, Vote};
