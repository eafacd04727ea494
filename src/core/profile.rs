//! Profile store - Reads and edits the per-account economic and display state.
//!
//! Every XP change goes through `set_xp`, which is the only writer of the
//! `level` column. Gem and streak arithmetic lives with the operations that
//! cause it (`core::task`, `core::economy`).

use crate::{
    auth::{self, Session},
    entities::{User, user},
    errors::{Error, Result},
    models::Gender,
};
use sea_orm::{Set, prelude::*};
use tracing::{info, instrument};

/// XP thresholds for levels 2 through 5, highest first.
const LEVEL_THRESHOLDS: [(i64, i32); 4] = [(1000, 5), (750, 4), (250, 3), (100, 2)];

/// Maps an XP total to a level in `1..=5`.
#[must_use]
pub fn level_for_xp(xp: i64) -> i32 {
    LEVEL_THRESHOLDS
        .iter()
        .find(|(threshold, _)| xp >= *threshold)
        .map_or(1, |(_, level)| *level)
}

/// Writes `xp` and the level derived from it.
pub(crate) fn set_xp(profile: &mut user::ActiveModel, xp: i64) {
    profile.xp = Set(xp);
    profile.level = Set(level_for_xp(xp));
}

/// Editable display fields, as collected by the onboarding screens.
#[derive(Debug, Clone)]
pub struct ProfileDetails {
    /// Display name
    pub name: String,
    /// Age in years
    pub age: i32,
    /// Avatar gender
    pub gender: Gender,
    /// Avatar reference
    pub avatar_id: String,
}

/// Finds a profile by id.
pub async fn get_profile(db: &DatabaseConnection, user_id: &str) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Exact-match username lookup.
pub async fn find_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Replaces the session user's motto.
#[instrument(skip(db, session), fields(user_id = session.user_id()))]
pub async fn update_motto(
    db: &DatabaseConnection,
    session: &Session,
    motto: &str,
) -> Result<user::Model> {
    let mut profile: user::ActiveModel = auth::current_user(db, session).await?.into();
    profile.motto = Set(motto.trim().to_string());
    profile.update(db).await.map_err(Into::into)
}

/// Stores the onboarding details and marks setup as complete.
///
/// # Errors
/// Returns `Error::Validation` for an empty name or a negative age.
#[instrument(skip(db, session, details), fields(user_id = session.user_id()))]
pub async fn update_details(
    db: &DatabaseConnection,
    session: &Session,
    details: ProfileDetails,
) -> Result<user::Model> {
    if details.name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Name cannot be empty".to_string(),
        });
    }
    if details.age < 0 {
        return Err(Error::Validation {
            message: format!("Age cannot be negative: {}", details.age),
        });
    }

    let mut profile: user::ActiveModel = auth::current_user(db, session).await?.into();
    profile.name = Set(details.name.trim().to_string());
    profile.age = Set(details.age);
    profile.gender = Set(details.gender.as_str().to_string());
    profile.avatar_id = Set(details.avatar_id);
    profile.is_setup_complete = Set(true);

    let updated = profile.update(db).await?;
    info!("Profile setup completed for {}", updated.username);
    Ok(updated)
}

/// Turns a child's sleep lock on or off. Returns None when the child does not exist.
#[instrument(skip(db, guardian), fields(guardian_id = guardian.user_id()))]
pub async fn set_sleep_mode(
    db: &DatabaseConnection,
    guardian: &Session,
    child_id: &str,
    enabled: bool,
) -> Result<Option<user::Model>> {
    let Some(child) = User::find_by_id(child_id).one(db).await? else {
        return Ok(None);
    };
    auth::ensure_manages(guardian, &child)?;

    let mut profile: user::ActiveModel = child.into();
    profile.sleep_mode = Set(enabled);
    let updated = profile.update(db).await?;
    info!("Sleep mode for {} set to {}", updated.username, enabled);
    Ok(Some(updated))
}
