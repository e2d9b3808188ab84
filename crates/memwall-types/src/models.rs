use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// -- Enumerations --

/// A string that does not name any variant of one of the closed enums below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::User => "user",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            "user" => Ok(Role::User),
            other => Err(UnknownVariant { kind: "role", value: other.to_string() }),
        }
    }
}

/// How often a visitor comes back; drives greeting copy in the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrequencyBucket {
    #[serde(rename = "new")]
    New,
    #[serde(rename = "regular")]
    Regular,
    #[serde(rename = "power-user")]
    PowerUser,
}

impl FromStr for FrequencyBucket {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(FrequencyBucket::New),
            "regular" => Ok(FrequencyBucket::Regular),
            "power-user" => Ok(FrequencyBucket::PowerUser),
            other => Err(UnknownVariant { kind: "frequency bucket", value: other.to_string() }),
        }
    }
}

/// Reactions offered on a message. Stored by name in the reactions table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Love,
    Laugh,
    Sad,
    Angry,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 5] = [
        ReactionKind::Like,
        ReactionKind::Love,
        ReactionKind::Laugh,
        ReactionKind::Sad,
        ReactionKind::Angry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Love => "love",
            ReactionKind::Laugh => "laugh",
            ReactionKind::Sad => "sad",
            ReactionKind::Angry => "angry",
        }
    }
}

impl FromStr for ReactionKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReactionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownVariant { kind: "emoji", value: s.to_string() })
    }
}

/// Part of the day an hour falls into.
///
/// `[5,12)` morning, `[12,17)` afternoon, `[17,22)` evening, everything else night.
/// Both the weekly report and the greeting shown to visitors depend on this table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }
}

// -- Rows --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub provider: String,
    pub provider_id: String,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub role: Role,
    pub banned: bool,
    pub avatar: Option<String>,
}

/// Per-user client profile. At most one row per `user_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserMeta {
    pub id: String,
    pub user_id: String,
    pub device_type: Option<String>,
    pub os: Option<String>,
    pub utc_offset: Option<i32>,
    pub referrer: Option<String>,
    pub utm_source: Option<String>,
    pub preferred_channel: Option<String>,
    pub theme: Option<String>,
    pub frequency_bucket: Option<FrequencyBucket>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub toxicity_score: f64,
    pub hidden: bool,
    pub hidden_reason: Option<String>,
    pub language: String,
    pub anonymous: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub id: String,
    pub message_id: String,
    pub user_id: String,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub id: String,
    pub week_start: DateTime<Utc>,
    pub week_end: DateTime<Utc>,
    pub report_json: WeeklyReport,
    pub created_at: DateTime<Utc>,
}

// -- Report snapshot --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    pub message_count: usize,
    pub active_users: usize,
    pub avg_toxicity: f64,
    pub total_reactions: usize,
    pub top_words: Vec<WordCount>,
    pub language_distribution: std::collections::BTreeMap<String, usize>,
    #[serde(default)]
    pub reaction_distribution: std::collections::BTreeMap<String, usize>,
    pub time_distribution: TimeDistribution,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub text: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeDistribution {
    pub morning: usize,
    pub afternoon: usize,
    pub evening: usize,
    pub night: usize,
}

impl TimeDistribution {
    pub fn record(&mut self, bucket: TimeOfDay) {
        match bucket {
            TimeOfDay::Morning => self.morning += 1,
            TimeOfDay::Afternoon => self.afternoon += 1,
            TimeOfDay::Evening => self.evening += 1,
            TimeOfDay::Night => self.night += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.morning + self.afternoon + self.evening + self.night
    }
}

// -- Insert payloads --
//
// The store assigns `id` and `created_at` (and `updated_at` on messages) when
// they are left out, so these carry only the caller-supplied columns.

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub email: Option<String>,
    pub name: Option<String>,
    pub provider: String,
    pub provider_id: String,
    pub last_login: DateTime<Utc>,
    pub role: Role,
    pub banned: bool,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub user_id: String,
    pub content: String,
    pub toxicity_score: f64,
    pub hidden: bool,
    pub hidden_reason: Option<String>,
    pub language: String,
    pub anonymous: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewReaction {
    pub message_id: String,
    pub user_id: String,
    pub emoji: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAnalyticsReport {
    pub week_start: DateTime<Utc>,
    pub week_end: DateTime<Utc>,
    pub report_json: WeeklyReport,
    pub created_at: DateTime<Utc>,
}

/// Partial update for a [`UserMeta`] row; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetaPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_offset: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_bucket: Option<FrequencyBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}
