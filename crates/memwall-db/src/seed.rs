use serde_json::{Value, json};
use tracing::info;

use crate::{Result, Row, Store, StoreError, tables};

/// Load the demo guestbook: five accounts (one per role plus an anonymous and
/// a banned one), their profiles, a handful of messages and reactions, and
/// two past weekly reports.
///
/// Rows carry explicit ids, so ids auto-assigned afterwards continue from 6,
/// 7 and so on.
pub fn seed_demo(store: &Store) -> Result<()> {
    let sets: [(&str, Value); 5] = [
        (tables::USERS, users()),
        (tables::USERS_META, users_meta()),
        (tables::MESSAGES, messages()),
        (tables::REACTIONS, reactions()),
        (tables::ANALYTICS, analytics()),
    ];

    for (table, rows) in sets {
        let Value::Array(rows) = rows else {
            return Err(StoreError::InvalidRecord(table.to_string()));
        };
        let count = rows.len();
        for row in rows {
            store.insert(table, into_row(table, row)?)?;
        }
        info!("Seeded {} rows into {}", count, table);
    }

    Ok(())
}

fn into_row(table: &str, value: Value) -> Result<Row> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::InvalidRecord(table.to_string())),
    }
}

fn users() -> Value {
    json!([
        {
            "id": "1", "email": "admin@example.com", "name": "Admin User",
            "provider": "google", "provider_id": "google-123",
            "created_at": "2025-01-01T12:00:00Z", "last_login": "2025-05-28T10:00:00Z",
            "role": "admin", "banned": false, "avatar": null
        },
        {
            "id": "2", "email": "user@example.com", "name": "Regular User",
            "provider": "github", "provider_id": "github-456",
            "created_at": "2025-02-15T14:30:00Z", "last_login": "2025-05-27T18:45:00Z",
            "role": "user", "banned": false, "avatar": null
        },
        {
            "id": "3", "email": "moderator@example.com", "name": "Moderator User",
            "provider": "google", "provider_id": "google-789",
            "created_at": "2025-03-10T09:15:00Z", "last_login": "2025-05-28T08:20:00Z",
            "role": "moderator", "banned": false, "avatar": null
        },
        {
            "id": "4", "email": null, "name": null,
            "provider": "anonymous", "provider_id": "anon-123",
            "created_at": "2025-05-20T16:40:00Z", "last_login": "2025-05-20T16:40:00Z",
            "role": "user", "banned": false, "avatar": null
        },
        {
            "id": "5", "email": "banned@example.com", "name": "Banned User",
            "provider": "github", "provider_id": "github-999",
            "created_at": "2025-04-05T11:25:00Z", "last_login": "2025-04-25T13:10:00Z",
            "role": "user", "banned": true, "avatar": null
        }
    ])
}

fn users_meta() -> Value {
    json!([
        {
            "id": "1", "user_id": "1", "device_type": "desktop", "os": "Windows",
            "utc_offset": 0, "referrer": "direct", "utm_source": null,
            "preferred_channel": "email", "theme": "dark",
            "frequency_bucket": "power-user", "language": "en"
        },
        {
            "id": "2", "user_id": "2", "device_type": "mobile", "os": "iOS",
            "utc_offset": -5, "referrer": "google", "utm_source": "newsletter",
            "preferred_channel": "telegram", "theme": "light",
            "frequency_bucket": "regular", "language": "ru"
        },
        {
            "id": "3", "user_id": "3", "device_type": "tablet", "os": "Android",
            "utc_offset": 3, "referrer": "twitter", "utm_source": null,
            "preferred_channel": "email", "theme": "auto",
            "frequency_bucket": "power-user", "language": "en"
        },
        {
            "id": "4", "user_id": "4", "device_type": "mobile", "os": "Android",
            "utc_offset": 2, "referrer": "direct", "utm_source": null,
            "preferred_channel": null, "theme": "auto",
            "frequency_bucket": "new", "language": "ru"
        },
        {
            "id": "5", "user_id": "5", "device_type": "desktop", "os": "macOS",
            "utc_offset": -8, "referrer": "facebook", "utm_source": "ad",
            "preferred_channel": null, "theme": "light",
            "frequency_bucket": "regular", "language": "en"
        }
    ])
}

fn messages() -> Value {
    json!([
        {
            "id": "1", "user_id": "2",
            "content": "Привет всем! Это мой первый пост в этой гостевой книге. Очень рад быть здесь!",
            "created_at": "2025-05-26T14:30:00Z", "updated_at": "2025-05-26T14:30:00Z",
            "toxicity_score": 0.01, "hidden": false, "hidden_reason": null,
            "language": "ru", "anonymous": false
        },
        {
            "id": "2", "user_id": "3",
            "content": "Welcome to our AI Memory Wall! Feel free to share your thoughts and experiences here.",
            "created_at": "2025-05-26T15:45:00Z", "updated_at": "2025-05-26T15:45:00Z",
            "toxicity_score": 0.02, "hidden": false, "hidden_reason": null,
            "language": "en", "anonymous": false
        },
        {
            "id": "3", "user_id": "4",
            "content": "Интересный проект! Мне нравится идея AI-персонализации.",
            "created_at": "2025-05-27T09:20:00Z", "updated_at": "2025-05-27T09:20:00Z",
            "toxicity_score": 0.03, "hidden": false, "hidden_reason": null,
            "language": "ru", "anonymous": true
        },
        {
            "id": "4", "user_id": "5",
            "content": "This is a terrible website and you should all feel bad about yourselves!",
            "created_at": "2025-05-27T16:10:00Z", "updated_at": "2025-05-27T16:10:00Z",
            "toxicity_score": 0.85, "hidden": true, "hidden_reason": "Toxic content",
            "language": "en", "anonymous": false
        },
        {
            "id": "5", "user_id": "2",
            "content": "I love how the site adapts to my preferences. The dark mode is especially nice for evening browsing.",
            "created_at": "2025-05-28T10:15:00Z", "updated_at": "2025-05-28T10:15:00Z",
            "toxicity_score": 0.01, "hidden": false, "hidden_reason": null,
            "language": "en", "anonymous": false
        }
    ])
}

fn reactions() -> Value {
    json!([
        { "id": "1", "message_id": "1", "user_id": "3", "emoji": "like", "created_at": "2025-05-26T14:35:00Z" },
        { "id": "2", "message_id": "1", "user_id": "1", "emoji": "love", "created_at": "2025-05-26T14:40:00Z" },
        { "id": "3", "message_id": "2", "user_id": "2", "emoji": "like", "created_at": "2025-05-26T15:50:00Z" },
        { "id": "4", "message_id": "2", "user_id": "4", "emoji": "laugh", "created_at": "2025-05-26T16:05:00Z" },
        { "id": "5", "message_id": "3", "user_id": "1", "emoji": "like", "created_at": "2025-05-27T09:30:00Z" },
        { "id": "6", "message_id": "5", "user_id": "3", "emoji": "love", "created_at": "2025-05-28T10:20:00Z" }
    ])
}

fn analytics() -> Value {
    json!([
        {
            "id": "1",
            "week_start": "2025-05-19T00:00:00Z",
            "week_end": "2025-05-25T23:59:59Z",
            "report_json": {
                "messageCount": 2, "activeUsers": 3, "avgToxicity": 0.015, "totalReactions": 4,
                "topWords": [
                    { "text": "welcome", "count": 2 },
                    { "text": "hello", "count": 2 },
                    { "text": "thoughts", "count": 1 },
                    { "text": "experiences", "count": 1 },
                    { "text": "привет", "count": 1 }
                ],
                "languageDistribution": { "en": 1, "ru": 1 },
                "timeDistribution": { "morning": 0, "afternoon": 2, "evening": 0, "night": 0 }
            },
            "created_at": "2025-05-26T00:05:00Z"
        },
        {
            "id": "2",
            "week_start": "2025-05-26T00:00:00Z",
            "week_end": "2025-05-28T23:59:59Z",
            "report_json": {
                "messageCount": 3, "activeUsers": 4, "avgToxicity": 0.29, "totalReactions": 2,
                "topWords": [
                    { "text": "ai", "count": 2 },
                    { "text": "интересный", "count": 1 },
                    { "text": "проект", "count": 1 },
                    { "text": "love", "count": 1 },
                    { "text": "dark", "count": 1 }
                ],
                "languageDistribution": { "en": 2, "ru": 1 },
                "timeDistribution": { "morning": 2, "afternoon": 0, "evening": 1, "night": 0 }
            },
            "created_at": "2025-05-28T12:00:00Z"
        }
    ])
}
