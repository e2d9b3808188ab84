use memwall_db::{Filter, Toggled, queries::to_row, tables};
use memwall_types::api::ReactionToggle;
use memwall_types::events::WallEvent;
use memwall_types::models::{NewReaction, ReactionKind};
use tracing::debug;

use crate::error::{Result, ServiceError};
use crate::state::AppStateInner;

/// Toggle a reaction: removes it if this user already left this emoji on
/// this message, adds it otherwise. A second identical call undoes the first.
pub fn add_reaction(
    state: &AppStateInner,
    message_id: &str,
    user_id: &str,
    emoji: &str,
) -> Result<ReactionToggle> {
    let kind: ReactionKind = emoji
        .parse()
        .map_err(|e| ServiceError::Validation(format!("{}", e)))?;

    let new = NewReaction {
        message_id: message_id.to_string(),
        user_id: user_id.to_string(),
        emoji: kind.as_str().to_string(),
    };
    let key = [
        Filter::eq("message_id", message_id),
        Filter::eq("user_id", user_id),
        Filter::eq("emoji", kind.as_str()),
    ];

    let toggled = state
        .store
        .toggle(tables::REACTIONS, &key, to_row(tables::REACTIONS, &new)?)?;
    let NewReaction { message_id, user_id, emoji } = new;

    match toggled {
        Toggled::Inserted(_) => {
            debug!(%message_id, %user_id, %emoji, "Reaction added");
            state.dispatcher.broadcast(WallEvent::ReactionAdd { message_id, user_id, emoji });
            Ok(ReactionToggle::ADDED)
        }
        Toggled::Removed(_) => {
            debug!(%message_id, %user_id, %emoji, "Reaction removed");
            state.dispatcher.broadcast(WallEvent::ReactionRemove { message_id, user_id, emoji });
            Ok(ReactionToggle::REMOVED)
        }
    }
}
