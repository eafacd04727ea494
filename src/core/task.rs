//! Task lifecycle - Quest creation, completion, approval and the daily reset.
//!
//! A quest is created `pending`, the child marks it `completed`, and a guardian
//! either approves it (gems, XP and a log entry; recurring quests go back to
//! `pending`, one-time quests are removed) or rejects it back to `pending`.
//! Calls made in the wrong state are reported as `None`, not as errors.

use crate::{
    auth::{self, Session},
    config::quests::QuestConfig,
    core::{
        badge,
        profile::set_xp,
        transaction::{NewTransaction, record_transaction},
    },
    entities::{Task, User, gem_transaction, reward, task, user},
    errors::{Error, Result},
    models::{TaskCategory, TaskStatus, TransactionType},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// XP granted for quests stored without an XP value.
pub const DEFAULT_TASK_XP: i64 = 10;

/// A quest as a guardian describes it.
#[derive(Debug, Clone)]
pub struct NewTask {
    /// Quest title
    pub title: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Category
    pub category: TaskCategory,
    /// Gems granted on approval
    pub reward: i64,
    /// XP granted on approval, `2 × reward` when not given
    pub xp: Option<i64>,
    /// Daily habit flag
    pub is_recurring: bool,
    /// Optional picture
    pub image: Option<String>,
}

impl NewTask {
    /// A one-time quest with default XP.
    #[must_use]
    pub fn new(title: impl Into<String>, category: TaskCategory, reward: i64) -> Self {
        Self {
            title: title.into(),
            description: None,
            category,
            reward,
            xp: None,
            is_recurring: false,
            image: None,
        }
    }
}

/// Everything an approval changed.
#[derive(Debug, Clone)]
pub struct Approval {
    /// The quest after approval; None when a one-time quest was removed
    pub task: Option<task::Model>,
    /// The credited profile
    pub user: user::Model,
    /// The `task` log entry
    pub transaction: gem_transaction::Model,
    /// Badges unlocked by the new balance
    pub badges: Vec<reward::Model>,
}

/// Result of a daily reset that actually ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyReset {
    /// Recurring quests put back to `pending`
    pub tasks_reset: u64,
    /// Whether a missed day reset the streak to 0
    pub streak_broken: bool,
}

async fn insert_task<C>(
    conn: &C,
    user_id: &str,
    new_task: NewTask,
    xp: i64,
) -> Result<task::Model>
where
    C: ConnectionTrait,
{
    task::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user_id: Set(user_id.to_string()),
        title: Set(new_task.title.trim().to_string()),
        description: Set(new_task.description),
        category: Set(new_task.category.as_str().to_string()),
        reward: Set(new_task.reward),
        xp: Set(xp),
        status: Set(TaskStatus::Pending.as_str().to_string()),
        is_recurring: Set(new_task.is_recurring),
        image: Set(new_task.image),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await
    .map_err(Into::into)
}

/// Creates a `pending` quest for a child the guardian manages.
///
/// # Errors
/// - `Error::Validation` for an empty title
/// - `Error::InvalidAmount` for a negative reward or XP
/// - `Error::UserNotFound` when the child does not exist
/// - `Error::Unauthorized` unless `guardian` manages the child
#[instrument(skip(db, guardian, new_task), fields(guardian_id = guardian.user_id()))]
pub async fn create_task(
    db: &DatabaseConnection,
    guardian: &Session,
    child_id: &str,
    new_task: NewTask,
) -> Result<task::Model> {
    if new_task.title.trim().is_empty() {
        return Err(Error::Validation {
            message: "Quest title cannot be empty".to_string(),
        });
    }
    if new_task.reward < 0 {
        return Err(Error::InvalidAmount {
            amount: new_task.reward,
        });
    }
    let xp = new_task.xp.unwrap_or(new_task.reward * 2);
    if xp < 0 {
        return Err(Error::InvalidAmount { amount: xp });
    }

    let child = User::find_by_id(child_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            id: child_id.to_string(),
        })?;
    auth::ensure_manages(guardian, &child)?;

    let created = insert_task(db, child_id, new_task, xp).await?;
    info!(
        "Created quest '{}' for {} ({} gems, {} xp)",
        created.title, child.username, created.reward, created.xp
    );
    Ok(created)
}

/// Seeds the default quests into a fresh account.
pub async fn seed_default_tasks<C>(
    conn: &C,
    user_id: &str,
    quests: &[QuestConfig],
) -> Result<Vec<task::Model>>
where
    C: ConnectionTrait,
{
    let mut seeded = Vec::with_capacity(quests.len());
    for quest in quests {
        let new_task = NewTask {
            title: quest.title.clone(),
            description: quest.description.clone(),
            category: quest.category,
            reward: quest.reward,
            xp: Some(quest.xp),
            is_recurring: quest.is_recurring,
            image: None,
        };
        seeded.push(insert_task(conn, user_id, new_task, quest.xp).await?);
    }
    debug!("Seeded {} default quests for {}", seeded.len(), user_id);
    Ok(seeded)
}

/// Finds a quest by id.
pub async fn get_task_by_id(db: &DatabaseConnection, task_id: &str) -> Result<Option<task::Model>> {
    Task::find_by_id(task_id).one(db).await.map_err(Into::into)
}

/// A user's quests, oldest first.
pub async fn get_tasks_for_user(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<task::Model>> {
    Task::find()
        .filter(task::Column::UserId.eq(user_id))
        .order_by_asc(task::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Quests waiting for a guardian's decision.
pub async fn get_tasks_awaiting_approval(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<task::Model>> {
    Task::find()
        .filter(task::Column::UserId.eq(user_id))
        .filter(task::Column::Status.eq(TaskStatus::Completed.as_str()))
        .order_by_asc(task::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Removes a quest. Returns the removed quest, or None when it did not exist.
#[instrument(skip(db, guardian), fields(guardian_id = guardian.user_id()))]
pub async fn delete_task(
    db: &DatabaseConnection,
    guardian: &Session,
    task_id: &str,
) -> Result<Option<task::Model>> {
    let Some(existing) = Task::find_by_id(task_id).one(db).await? else {
        return Ok(None);
    };
    let Some(owner) = User::find_by_id(existing.user_id.as_str()).one(db).await? else {
        return Ok(None);
    };
    auth::ensure_manages(guardian, &owner)?;

    existing.clone().delete(db).await?;
    info!("Deleted quest '{}' of {}", existing.title, owner.username);
    Ok(Some(existing))
}

/// The child marks one of their `pending` quests as done. No gems move yet.
///
/// Returns None when the quest does not exist or is not `pending`.
#[instrument(skip(db, child), fields(user_id = child.user_id()))]
pub async fn mark_complete(
    db: &DatabaseConnection,
    child: &Session,
    task_id: &str,
) -> Result<Option<task::Model>> {
    let Some(existing) = Task::find_by_id(task_id).one(db).await? else {
        return Ok(None);
    };
    auth::ensure_owner(child, &existing.user_id)?;

    if existing.status != TaskStatus::Pending.as_str() {
        debug!("Quest {} is {}, not pending", existing.id, existing.status);
        return Ok(None);
    }

    let mut active: task::ActiveModel = existing.into();
    active.status = Set(TaskStatus::Completed.as_str().to_string());
    let updated = active.update(db).await?;
    info!("Quest '{}' marked complete", updated.title);
    Ok(Some(updated))
}

/// A guardian approves a `completed` quest and pays it out.
///
/// Recurring quests return to `pending`, one-time quests are deleted. The owner
/// gains the reward in gems, lifetime gems and weekly gems, the quest's XP (with a
/// level recompute) and one completed quest; a `task` entry is logged and badges
/// are re-evaluated. All of it commits as one database transaction.
///
/// Returns None when the quest or its owner is missing or the quest is not `completed`.
#[instrument(skip(db, guardian), fields(guardian_id = guardian.user_id()))]
pub async fn approve_task(
    db: &DatabaseConnection,
    guardian: &Session,
    task_id: &str,
) -> Result<Option<Approval>> {
    let txn = db.begin().await?;

    let Some(existing) = Task::find_by_id(task_id).one(&txn).await? else {
        return Ok(None);
    };
    if existing.status != TaskStatus::Completed.as_str() {
        debug!("Quest {} is {}, not completed", existing.id, existing.status);
        return Ok(None);
    }
    let Some(owner) = User::find_by_id(existing.user_id.as_str()).one(&txn).await? else {
        return Ok(None);
    };
    auth::ensure_manages(guardian, &owner)?;

    let reward = existing.reward;
    let xp_gain = if existing.xp > 0 {
        existing.xp
    } else {
        DEFAULT_TASK_XP
    };
    let title = existing.title.clone();

    let remaining = if existing.is_recurring {
        let mut active: task::ActiveModel = existing.into();
        active.status = Set(TaskStatus::Pending.as_str().to_string());
        Some(active.update(&txn).await?)
    } else {
        existing.delete(&txn).await?;
        None
    };

    let mut profile: user::ActiveModel = owner.clone().into();
    profile.gems = Set(owner.gems + reward);
    profile.lifetime_gems = Set(owner.lifetime_gems + reward);
    profile.gems_this_week = Set(owner.gems_this_week + reward);
    profile.quests_completed = Set(owner.quests_completed + 1);
    set_xp(&mut profile, owner.xp + xp_gain);
    let user = profile.update(&txn).await?;

    let transaction = record_transaction(
        &txn,
        NewTransaction {
            user_id: &user.id,
            transaction_type: TransactionType::Task,
            amount: reward,
            title,
            category: Some("Daily Task"),
            icon: Some("📝"),
        },
    )
    .await?;

    let badges = badge::evaluate_badges(&txn, &user.id).await?;
    txn.commit().await?;

    info!(
        "Approved '{}' for {}: +{} gems, +{} xp (level {})",
        transaction.title, user.username, reward, xp_gain, user.level
    );
    Ok(Some(Approval {
        task: remaining,
        user,
        transaction,
        badges,
    }))
}

/// A guardian sends a quest back to `pending`, whatever its state or recurrence.
/// Nothing is paid and nothing is logged. Returns None when the quest is missing.
#[instrument(skip(db, guardian), fields(guardian_id = guardian.user_id()))]
pub async fn reject_task(
    db: &DatabaseConnection,
    guardian: &Session,
    task_id: &str,
) -> Result<Option<task::Model>> {
    let Some(existing) = Task::find_by_id(task_id).one(db).await? else {
        return Ok(None);
    };
    let Some(owner) = User::find_by_id(existing.user_id.as_str()).one(db).await? else {
        return Ok(None);
    };
    auth::ensure_manages(guardian, &owner)?;

    let mut active: task::ActiveModel = existing.into();
    active.status = Set(TaskStatus::Pending.as_str().to_string());
    let updated = active.update(db).await?;
    info!("Rejected quest '{}' of {}", updated.title, owner.username);
    Ok(Some(updated))
}

/// Runs the once-per-day maintenance for the session user as of `today`.
///
/// Every recurring quest goes back to `pending`; if more than one calendar day
/// passed since the last run the check-in streak is reset to 0; the run date is
/// stamped. Returns None when it already ran on `today`.
#[instrument(skip(db, session), fields(user_id = session.user_id()))]
pub async fn reset_daily_recurring_on(
    db: &DatabaseConnection,
    session: &Session,
    today: NaiveDate,
) -> Result<Option<DailyReset>> {
    let user = auth::current_user(db, session).await?;
    if user.last_login_date == Some(today) {
        debug!("Daily reset already ran on {}", today);
        return Ok(None);
    }

    let streak_broken = user
        .last_login_date
        .is_some_and(|last| (today - last).num_days() > 1);

    let txn = db.begin().await?;

    let tasks_reset = Task::update_many()
        .col_expr(task::Column::Status, Expr::value(TaskStatus::Pending.as_str()))
        .filter(task::Column::UserId.eq(user.id.as_str()))
        .filter(task::Column::IsRecurring.eq(true))
        .exec(&txn)
        .await?
        .rows_affected;

    let mut profile: user::ActiveModel = user.into();
    profile.last_login_date = Set(Some(today));
    if streak_broken {
        profile.streak = Set(0);
    }
    profile.update(&txn).await?;

    txn.commit().await?;

    info!(
        "Daily reset on {}: {} recurring quests reset, streak broken: {}",
        today, tasks_reset, streak_broken
    );
    Ok(Some(DailyReset {
        tasks_reset,
        streak_broken,
    }))
}

/// [`reset_daily_recurring_on`] for the current UTC date.
pub async fn reset_daily_recurring(
    db: &DatabaseConnection,
    session: &Session,
) -> Result<Option<DailyReset>> {
    reset_daily_recurring_on(db, session, Utc::now().date_naive()).await
}
