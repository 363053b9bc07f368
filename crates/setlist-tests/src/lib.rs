//! Integration and property tests for Setlist.
//!
//! The tests in `tests/` drive the metrics engine end to end through the
//! `Dataset` contract, using the fixture leagues in [`helpers`].

pub mod helpers;
