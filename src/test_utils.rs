//! Shared test utilities for `GemQuest`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating households, quests and rewards with sensible defaults.
//! Accounts are inserted directly with a placeholder hash so tests do not pay
//! for Argon2 on every setup.

use crate::{
    auth::Session,
    core::{
        reward::{self, NewReward},
        task::{self, NewTask},
    },
    entities::{User, user},
    errors::{Error, Result},
    models::{Role, TaskCategory},
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set, prelude::*};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

async fn insert_account(
    db: &DatabaseConnection,
    username: &str,
    role: Role,
    guardian_id: Option<String>,
) -> Result<(user::Model, Session)> {
    let profile = user::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        username: Set(username.to_string()),
        pin_hash: Set("test-hash".to_string()),
        role: Set(role.as_str().to_string()),
        guardian_id: Set(guardian_id),
        name: Set(username.to_string()),
        age: Set(if role == Role::Child { 9 } else { 38 }),
        gender: Set("girl".to_string()),
        avatar_id: Set("girl1".to_string()),
        gems: Set(0),
        lifetime_gems: Set(0),
        xp: Set(0),
        level: Set(1),
        streak: Set(0),
        best_streak: Set(0),
        gems_this_week: Set(0),
        quests_completed: Set(0),
        sleep_mode: Set(false),
        is_setup_complete: Set(false),
        last_login_date: Set(None),
        last_check_in_date: Set(None),
        motto: Set(String::new()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    let session = Session::for_user(&profile)?;
    Ok((profile, session))
}

/// Creates a guardian account and a session for it.
pub async fn create_test_guardian(
    db: &DatabaseConnection,
    username: &str,
) -> Result<(user::Model, Session)> {
    insert_account(db, username, Role::Guardian, None).await
}

/// Creates a child account managed by `guardian` and a session for it.
pub async fn create_test_child(
    db: &DatabaseConnection,
    guardian: &Session,
    username: &str,
) -> Result<(user::Model, Session)> {
    insert_account(db, username, Role::Child, Some(guardian.user_id().to_string())).await
}

/// Sets up a guardian with one child.
/// Returns (db, guardian, `guardian_session`, child, `child_session`).
pub async fn setup_household() -> Result<(
    DatabaseConnection,
    user::Model,
    Session,
    user::Model,
    Session,
)> {
    let db = setup_test_db().await?;
    let (guardian, guardian_session) = create_test_guardian(&db, "parent").await?;
    let (child, child_session) = create_test_child(&db, &guardian_session, "kid").await?;
    Ok((db, guardian, guardian_session, child, child_session))
}

/// Reloads a profile, failing the test if it is gone.
pub async fn reload_user(db: &DatabaseConnection, user_id: &str) -> Result<user::Model> {
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            id: user_id.to_string(),
        })
}

/// Overwrites a balance without logging a transaction.
pub async fn set_test_gems(db: &DatabaseConnection, user_id: &str, gems: i64) -> Result<()> {
    let mut profile: user::ActiveModel = reload_user(db, user_id).await?.into();
    profile.gems = Set(gems);
    profile.lifetime_gems = Set(gems);
    profile.update(db).await?;
    Ok(())
}

/// Overwrites the check-in streak.
pub async fn set_test_streak(db: &DatabaseConnection, user_id: &str, streak: i32) -> Result<()> {
    let mut profile: user::ActiveModel = reload_user(db, user_id).await?.into();
    profile.streak = Set(streak);
    profile.update(db).await?;
    Ok(())
}

/// Creates a quest with sensible defaults.
///
/// # Defaults
/// * `category`: Chores
/// * `xp`: `2 × reward`
pub async fn create_test_task(
    db: &DatabaseConnection,
    guardian: &Session,
    child_id: &str,
    reward: i64,
    is_recurring: bool,
) -> Result<crate::entities::task::Model> {
    let mut new_task = NewTask::new("Test quest", TaskCategory::Chores, reward);
    new_task.is_recurring = is_recurring;
    task::create_task(db, guardian, child_id, new_task).await
}

/// Creates an unlocked voucher.
pub async fn create_test_reward(
    db: &DatabaseConnection,
    guardian: &Session,
    child_id: &str,
    title: &str,
    cost: i64,
) -> Result<crate::entities::reward::Model> {
    reward::create_reward(db, guardian, child_id, NewReward::voucher(title, cost)).await
}
