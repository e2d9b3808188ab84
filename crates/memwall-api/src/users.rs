use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use memwall_db::{Filter, queries::{from_row, to_row}, tables};
use memwall_types::events::WallEvent;
use memwall_types::models::{NewUser, Role, User, UserMeta, UserMetaPatch};

use crate::error::{Result, ServiceError};
use crate::state::AppStateInner;

/// Identity handed over by the external sign-in provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignIn {
    pub provider: String,
    pub provider_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Serialize)]
struct LastLogin {
    last_login: DateTime<Utc>,
}

#[derive(Serialize)]
struct BanPatch {
    banned: bool,
}

#[derive(Serialize)]
struct RolePatch {
    role: Role,
}

pub fn get_all_users(state: &AppStateInner) -> Result<Vec<User>> {
    Ok(state.store.select_as(tables::USERS, &[])?)
}

pub fn get_user(state: &AppStateInner, user_id: &str) -> Result<Option<User>> {
    let users: Vec<User> = state.store.select_as(tables::USERS, &[Filter::eq("id", user_id)])?;
    Ok(users.into_iter().next())
}

/// Create the account on first sign-in, otherwise bump `last_login`.
/// Accounts are keyed by `(provider, provider_id)` and start as plain,
/// unbanned users.
pub fn record_sign_in(state: &AppStateInner, identity: &SignIn) -> Result<User> {
    let now = Utc::now();
    let key = [
        Filter::eq("provider", identity.provider.as_str()),
        Filter::eq("provider_id", identity.provider_id.as_str()),
    ];
    let new = NewUser {
        email: identity.email.clone(),
        name: identity.name.clone(),
        provider: identity.provider.clone(),
        provider_id: identity.provider_id.clone(),
        last_login: now,
        role: Role::User,
        banned: false,
        avatar: identity.avatar.clone(),
    };

    let (row, inserted) = state
        .store
        .find_or_insert(tables::USERS, &key, to_row(tables::USERS, &new)?)?;
    let user: User = from_row(row)?;
    if inserted {
        info!(id = %user.id, provider = %user.provider, "User created on first sign-in");
        return Ok(user);
    }

    let updated: Vec<User> = state.store.update_as(
        tables::USERS,
        &[Filter::eq("id", user.id.as_str())],
        &LastLogin { last_login: now },
    )?;
    Ok(updated.into_iter().next().unwrap_or(user))
}

pub fn toggle_user_ban(state: &AppStateInner, user_id: &str, banned: bool) -> Result<User> {
    let user = update_user(state, user_id, &BanPatch { banned })?;
    info!(id = %user.id, banned, "User ban state changed");
    state.dispatcher.broadcast(WallEvent::UserBanned { user_id: user.id.clone(), banned });
    Ok(user)
}

/// Set a user's role from its wire name (`admin`, `moderator`, `user`).
pub fn set_user_role(state: &AppStateInner, user_id: &str, role: &str) -> Result<User> {
    let role: Role = role
        .parse()
        .map_err(|e| ServiceError::Validation(format!("{}", e)))?;

    let user = update_user(state, user_id, &RolePatch { role })?;
    info!(id = %user.id, role = role.as_str(), "User role changed");
    state.dispatcher.broadcast(WallEvent::UserRoleChanged { user_id: user.id.clone(), role });
    Ok(user)
}

fn update_user<P: Serialize>(state: &AppStateInner, user_id: &str, patch: &P) -> Result<User> {
    let updated: Vec<User> =
        state
            .store
            .update_as(tables::USERS, &[Filter::eq("id", user_id)], patch)?;
    updated.into_iter().next().ok_or_else(|| ServiceError::NotFound {
        entity: "User",
        id: user_id.to_string(),
    })
}

// -- Metadata --

pub fn get_user_metadata(state: &AppStateInner, user_id: &str) -> Result<Option<UserMeta>> {
    let rows: Vec<UserMeta> = state
        .store
        .select_as(tables::USERS_META, &[Filter::eq("user_id", user_id)])?;
    Ok(rows.into_iter().next())
}

/// Merge `patch` into the user's metadata row, creating it if absent.
/// Never leaves more than one row per user.
pub fn update_user_metadata(
    state: &AppStateInner,
    user_id: &str,
    patch: &UserMetaPatch,
) -> Result<UserMeta> {
    Ok(state
        .store
        .upsert_as(tables::USERS_META, &[Filter::eq("user_id", user_id)], patch)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use memwall_db::{Store, seed};
    use memwall_types::models::FrequencyBucket;

    fn seeded() -> AppStateInner {
        let store = Store::new();
        seed::seed_demo(&store).unwrap();
        AppStateInner::new(store)
    }

    #[test]
    fn ban_and_unban() {
        let state = seeded();
        assert!(toggle_user_ban(&state, "2", true).unwrap().banned);
        assert!(!toggle_user_ban(&state, "2", false).unwrap().banned);
    }

    #[test]
    fn ban_on_missing_user_is_not_found() {
        let state = seeded();
        let err = toggle_user_ban(&state, "99", true).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "User", .. }));
    }

    #[test]
    fn role_is_validated() {
        let state = seeded();
        assert_eq!(set_user_role(&state, "2", "moderator").unwrap().role, Role::Moderator);

        let err = set_user_role(&state, "2", "root").unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(get_user(&state, "2").unwrap().unwrap().role, Role::Moderator);
    }

    #[test]
    fn sign_in_creates_once_then_touches_last_login() {
        let state = seeded();
        let identity = SignIn {
            provider: "github".into(),
            provider_id: "github-777".into(),
            email: Some("new@example.com".into()),
            name: Some("Newcomer".into()),
            avatar: None,
        };

        let created = record_sign_in(&state, &identity).unwrap();
        assert_eq!(created.id, "6");
        assert_eq!(created.role, Role::User);
        assert!(!created.banned);

        let again = record_sign_in(&state, &identity).unwrap();
        assert_eq!(again.id, created.id);
        assert!(again.last_login >= created.last_login);
        assert_eq!(get_all_users(&state).unwrap().len(), 6);
    }

    #[test]
    fn existing_account_keeps_its_role_on_sign_in() {
        let state = seeded();
        let admin = record_sign_in(
            &state,
            &SignIn {
                provider: "google".into(),
                provider_id: "google-123".into(),
                email: None,
                name: None,
                avatar: None,
            },
        )
        .unwrap();
        assert_eq!(admin.id, "1");
        assert_eq!(admin.role, Role::Admin);
    }

    #[test]
    fn metadata_upsert_keeps_one_row() {
        let state = seeded();

        let updated = update_user_metadata(
            &state,
            "2",
            &UserMetaPatch { language: Some("en".into()), ..Default::default() },
        )
        .unwrap();
        assert_eq!(updated.language.as_deref(), Some("en"));
        assert_eq!(updated.theme.as_deref(), Some("light"));

        let created = update_user_metadata(
            &state,
            "42",
            &UserMetaPatch {
                frequency_bucket: Some(FrequencyBucket::New),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(created.user_id, "42");
        assert_eq!(created.frequency_bucket, Some(FrequencyBucket::New));

        update_user_metadata(&state, "42", &UserMetaPatch::default()).unwrap();
        let rows = state
            .store
            .select(tables::USERS_META, &[Filter::eq("user_id", "42")])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(get_user_metadata(&state, "404").unwrap().is_none());
    }
}
