use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use memwall_db::{Filter, OrderBy, tables};
use memwall_types::api::{AuthorSummary, MessageView};
use memwall_types::events::WallEvent;
use memwall_types::models::{Message, NewMessage, Reaction, User};

use crate::error::{Result, ServiceError};
use crate::state::AppStateInner;

pub const AUTO_HIDDEN_REASON: &str = "Automatic toxicity detection";

#[derive(Debug, Serialize)]
struct VisibilityPatch<'a> {
    hidden: bool,
    hidden_reason: Option<&'a str>,
    updated_at: DateTime<Utc>,
}

/// "ru" when the text contains any Cyrillic letter, "en" otherwise.
pub fn detect_language(content: &str) -> &'static str {
    let cyrillic = content
        .chars()
        .any(|c| c.is_alphabetic() && ('\u{0400}'..='\u{04FF}').contains(&c));
    if cyrillic { "ru" } else { "en" }
}

/// Score and store a new post. Posts the moderator flags are stored hidden.
/// Blank content is rejected before anything is written.
pub fn create_message(
    state: &AppStateInner,
    content: &str,
    user_id: &str,
    anonymous: bool,
) -> Result<Message> {
    if content.trim().is_empty() {
        return Err(ServiceError::Validation("message content is empty".into()));
    }

    let moderation = state.moderator.check(content);
    let new = NewMessage {
        user_id: user_id.to_string(),
        content: content.to_string(),
        toxicity_score: moderation.score,
        hidden: moderation.flagged,
        hidden_reason: moderation.flagged.then(|| AUTO_HIDDEN_REASON.to_string()),
        language: detect_language(content).to_string(),
        anonymous,
    };

    let message: Message = state.store.insert_as(tables::MESSAGES, &new)?;
    info!(
        id = %message.id,
        user_id = %message.user_id,
        score = message.toxicity_score,
        hidden = message.hidden,
        "Message created"
    );

    state.dispatcher.broadcast(WallEvent::MessageCreate {
        id: message.id.clone(),
        user_id: message.user_id.clone(),
        hidden: message.hidden,
        timestamp: message.created_at,
    });

    Ok(message)
}

/// Every message, newest first, with its author's public profile and a
/// per-emoji reaction count.
///
/// Users and reactions are read in one pass each rather than per message;
/// the three reads are not a single snapshot.
pub fn get_all_messages(state: &AppStateInner) -> Result<Vec<MessageView>> {
    let messages: Vec<Message> = state
        .store
        .select_ordered_as(tables::MESSAGES, &OrderBy::desc("created_at"))?;
    let users: Vec<User> = state.store.select_as(tables::USERS, &[])?;
    let reactions: Vec<Reaction> = state.store.select_as(tables::REACTIONS, &[])?;

    let authors: HashMap<&str, AuthorSummary> = users
        .iter()
        .map(|u| {
            (
                u.id.as_str(),
                AuthorSummary { name: u.name.clone(), avatar: u.avatar.clone() },
            )
        })
        .collect();

    // message_id -> emoji -> count
    let mut counts: HashMap<&str, BTreeMap<String, usize>> = HashMap::new();
    for r in &reactions {
        *counts
            .entry(r.message_id.as_str())
            .or_default()
            .entry(r.emoji.clone())
            .or_default() += 1;
    }

    let views = messages
        .into_iter()
        .map(|message| {
            let user = authors.get(message.user_id.as_str()).cloned();
            let reactions = counts.remove(message.id.as_str()).unwrap_or_default();
            MessageView { message, user, reactions }
        })
        .collect::<Vec<_>>();

    debug!("Loaded {} messages", views.len());
    Ok(views)
}

/// Hide (`hidden = true`, with `reason`) or restore a message. Restoring
/// always clears the reason. Returns `None` when no such message exists.
pub fn toggle_message_visibility(
    state: &AppStateInner,
    message_id: &str,
    hidden: bool,
    reason: Option<&str>,
) -> Result<Option<Message>> {
    let patch = VisibilityPatch {
        hidden,
        hidden_reason: if hidden { reason } else { None },
        updated_at: Utc::now(),
    };

    let updated: Vec<Message> =
        state
            .store
            .update_as(tables::MESSAGES, &[Filter::eq("id", message_id)], &patch)?;

    let Some(message) = updated.into_iter().next() else {
        debug!(message_id, "Visibility change for unknown message ignored");
        return Ok(None);
    };

    info!(id = %message.id, hidden, "Message visibility changed");
    state.dispatcher.broadcast(WallEvent::MessageVisibility {
        id: message.id.clone(),
        hidden: message.hidden,
        reason: message.hidden_reason.clone(),
    });

    Ok(Some(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use memwall_db::Store;

    fn state() -> AppStateInner {
        AppStateInner::new(Store::new())
    }

    #[test]
    fn language_follows_cyrillic_letters() {
        assert_eq!(detect_language("Привет"), "ru");
        assert_eq!(detect_language("hello, Мир"), "ru");
        assert_eq!(detect_language("hello world"), "en");
        assert_eq!(detect_language("12345 !?"), "en");
    }

    #[test]
    fn toxic_post_is_stored_hidden() {
        let state = state();
        let message = create_message(
            &state,
            "This is a terrible website and you should all feel bad about yourselves!",
            "5",
            false,
        )
        .unwrap();

        assert!(message.hidden);
        assert_eq!(message.hidden_reason.as_deref(), Some(AUTO_HIDDEN_REASON));
        assert!(message.toxicity_score >= 0.7);
        assert_eq!(message.language, "en");
        assert_eq!(message.created_at, message.updated_at);
    }

    #[test]
    fn friendly_post_is_visible() {
        let state = state();
        let message = create_message(&state, "Всем хорошего дня", "2", true).unwrap();
        assert!(!message.hidden);
        assert_eq!(message.hidden_reason, None);
        assert_eq!(message.language, "ru");
        assert!(message.anonymous);
    }

    #[test]
    fn blank_post_is_rejected() {
        let state = state();
        let err = create_message(&state, "   \n\t", "2", false).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(state.store.select(tables::MESSAGES, &[]).unwrap().is_empty());
    }

    #[test]
    fn hiding_sets_reason_and_restoring_clears_it() {
        let state = state();
        let message = create_message(&state, "hello", "1", false).unwrap();

        let hidden = toggle_message_visibility(&state, &message.id, true, Some("x"))
            .unwrap()
            .unwrap();
        assert!(hidden.hidden);
        assert_eq!(hidden.hidden_reason.as_deref(), Some("x"));
        assert!(hidden.updated_at >= message.updated_at);

        let shown = toggle_message_visibility(&state, &message.id, false, Some("ignored"))
            .unwrap()
            .unwrap();
        assert!(!shown.hidden);
        assert_eq!(shown.hidden_reason, None);
    }

    #[test]
    fn unknown_message_visibility_is_none() {
        let state = state();
        assert!(toggle_message_visibility(&state, "404", true, None).unwrap().is_none());
    }
}
