//! Cross-catalog track matching.
//!
//! A source item is reconciled against the destination catalog by issuing
//! one search and scoring the top hit with a normalized edit-distance
//! heuristic. Matching is best-effort, never authoritative.

pub mod matcher;
pub mod similarity;

pub use matcher::{MatchCandidate, Matcher};
pub use similarity::{normalize, score};
