//! Memory Wall moderation
//!
//! Deterministic keyword/shouting heuristic that scores message text in
//! `[0, 1]` and decides whether a post is hidden on arrival.
//!
//! The [`Moderator`] trait is the seam for swapping in a remote classifier;
//! wrap it in [`FailOpen`] so an unavailable classifier lets posts through
//! instead of blocking them.

pub mod moderator;
pub mod scorer;

pub use moderator::{FailOpen, KeywordModerator, Moderator, ScoringError};
pub use scorer::{CategoryFlags, CategoryScores, ModerationResult, ToxicityCheck, score};
