use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Message;

// -- Messages --

/// Public profile of a message author, attached at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

/// A message as the feed shows it: the stored row plus its author and a
/// per-emoji reaction count. Neither extra is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub user: Option<AuthorSummary>,
    pub reactions: BTreeMap<String, usize>,
}

// -- Reactions --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionToggle {
    pub added: bool,
    pub removed: bool,
}

impl ReactionToggle {
    pub const ADDED: ReactionToggle = ReactionToggle { added: true, removed: false };
    pub const REMOVED: ReactionToggle = ReactionToggle { added: false, removed: true };
}
