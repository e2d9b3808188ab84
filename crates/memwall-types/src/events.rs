use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Role;

/// Events published by the services after a successful write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WallEvent {
    /// A new message was stored (possibly already hidden by moderation)
    MessageCreate {
        id: String,
        user_id: String,
        hidden: bool,
        timestamp: DateTime<Utc>,
    },

    /// A moderator hid or restored a message
    MessageVisibility {
        id: String,
        hidden: bool,
        reason: Option<String>,
    },

    /// A reaction was added to a message
    ReactionAdd {
        message_id: String,
        user_id: String,
        emoji: String,
    },

    /// A reaction was removed from a message
    ReactionRemove {
        message_id: String,
        user_id: String,
        emoji: String,
    },

    UserBanned { user_id: String, banned: bool },

    UserRoleChanged { user_id: String, role: Role },

    /// A weekly report row was written
    AnalyticsReady {
        id: String,
        week_start: DateTime<Utc>,
    },
}
