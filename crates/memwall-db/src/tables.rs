//! Table names used by the services. Distinct from the typed models in
//! memwall-types so the store itself stays schema-agnostic.

pub const USERS: &str = "users";
pub const USERS_META: &str = "users_meta";
pub const MESSAGES: &str = "messages";
pub const REACTIONS: &str = "reactions";
pub const ANALYTICS: &str = "analytics";

pub(crate) const CREATED_ONLY: &[&str] = &["created_at"];
const CREATED_AND_UPDATED: &[&str] = &["created_at", "updated_at"];

/// Registered tables and the timestamp columns each one stamps on insert.
pub(crate) const SCHEMA: &[(&str, &[&str])] = &[
    (USERS, CREATED_ONLY),
    (USERS_META, CREATED_ONLY),
    (MESSAGES, CREATED_AND_UPDATED),
    (REACTIONS, CREATED_ONLY),
    (ANALYTICS, CREATED_ONLY),
];
