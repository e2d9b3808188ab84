use thiserror::Error;
use tracing::warn;

use crate::scorer::{self, ModerationResult};

#[derive(Error, Debug)]
pub enum ScoringError {
    /// The classifier could not produce an answer (offline, timed out, quota).
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),
}

/// Anything that can score message text.
pub trait Moderator: Send + Sync {
    fn moderate(&self, text: &str) -> Result<ModerationResult, ScoringError>;
}

impl<M: Moderator + ?Sized> Moderator for Box<M> {
    fn moderate(&self, text: &str) -> Result<ModerationResult, ScoringError> {
        (**self).moderate(text)
    }
}

/// The built-in keyword heuristic. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordModerator;

impl Moderator for KeywordModerator {
    fn moderate(&self, text: &str) -> Result<ModerationResult, ScoringError> {
        Ok(scorer::score(text))
    }
}

/// Turns classifier failures into a clean result so posting never blocks on
/// moderation. The message is stored with score 0 and left visible.
#[derive(Debug, Clone, Default)]
pub struct FailOpen<M> {
    inner: M,
}

impl<M: Moderator> FailOpen<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }

    pub fn check(&self, text: &str) -> ModerationResult {
        match self.inner.moderate(text) {
            Ok(result) => result,
            Err(e) => {
                warn!("Moderation unavailable, accepting unscored: {}", e);
                ModerationResult::clean()
            }
        }
    }
}

impl<M: Moderator> Moderator for FailOpen<M> {
    fn moderate(&self, text: &str) -> Result<ModerationResult, ScoringError> {
        Ok(self.check(text))
    }
}
