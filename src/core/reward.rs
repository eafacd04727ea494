//! Reward catalog - Guardian-managed vouchers and items for a child.
//!
//! Badges share the rewards table but are owned by the badge evaluator, so
//! the catalog operations here refuse to create or remove them.

use crate::{
    auth::{self, Session},
    entities::{Reward, User, reward},
    errors::{Error, Result},
    models::RewardType,
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};
use uuid::Uuid;

/// A catalog entry as a guardian describes it.
#[derive(Debug, Clone)]
pub struct NewReward {
    /// Display title
    pub title: String,
    /// Optional tagline
    pub subtitle: Option<String>,
    /// Price in gems
    pub cost: i64,
    /// Emoji or image URL
    pub image: String,
    /// Voucher or item
    pub reward_type: RewardType,
}

impl NewReward {
    /// An unlocked voucher with a gift emoji.
    #[must_use]
    pub fn voucher(title: impl Into<String>, cost: i64) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            cost,
            image: "🎁".to_string(),
            reward_type: RewardType::Voucher,
        }
    }
}

async fn managed_reward(
    db: &DatabaseConnection,
    guardian: &Session,
    reward_id: &str,
) -> Result<Option<reward::Model>> {
    let Some(existing) = Reward::find_by_id(reward_id).one(db).await? else {
        return Ok(None);
    };
    let Some(owner) = User::find_by_id(existing.user_id.as_str()).one(db).await? else {
        return Ok(None);
    };
    auth::ensure_manages(guardian, &owner)?;
    Ok(Some(existing))
}

/// Adds a voucher or item to a managed child's catalog.
///
/// # Errors
/// - `Error::Validation` for an empty title or a badge type
/// - `Error::InvalidAmount` for a negative cost
/// - `Error::UserNotFound` when the child does not exist
/// - `Error::Unauthorized` unless `guardian` manages the child
#[instrument(skip(db, guardian, new_reward), fields(guardian_id = guardian.user_id()))]
pub async fn create_reward(
    db: &DatabaseConnection,
    guardian: &Session,
    child_id: &str,
    new_reward: NewReward,
) -> Result<reward::Model> {
    if new_reward.title.trim().is_empty() {
        return Err(Error::Validation {
            message: "Reward title cannot be empty".to_string(),
        });
    }
    if new_reward.reward_type == RewardType::Badge {
        return Err(Error::Validation {
            message: "Badges are granted automatically".to_string(),
        });
    }
    if new_reward.cost < 0 {
        return Err(Error::InvalidAmount {
            amount: new_reward.cost,
        });
    }

    let child = User::find_by_id(child_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            id: child_id.to_string(),
        })?;
    auth::ensure_manages(guardian, &child)?;

    let created = reward::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user_id: Set(child.id.clone()),
        title: Set(new_reward.title.trim().to_string()),
        subtitle: Set(new_reward.subtitle),
        cost: Set(new_reward.cost),
        image: Set(new_reward.image),
        reward_type: Set(new_reward.reward_type.as_str().to_string()),
        purchased: Set(false),
        purchased_at: Set(None),
        is_locked: Set(false),
        badge_key: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    info!(
        "Created {} '{}' for {} ({} gems)",
        created.reward_type, created.title, child.username, created.cost
    );
    Ok(created)
}

/// Removes a voucher or item. Returns None when it did not exist.
///
/// # Errors
/// `Error::Validation` when the reward is a badge.
#[instrument(skip(db, guardian), fields(guardian_id = guardian.user_id()))]
pub async fn delete_reward(
    db: &DatabaseConnection,
    guardian: &Session,
    reward_id: &str,
) -> Result<Option<reward::Model>> {
    let Some(existing) = managed_reward(db, guardian, reward_id).await? else {
        return Ok(None);
    };
    if existing.reward_type == RewardType::Badge.as_str() {
        return Err(Error::Validation {
            message: format!("Badge '{}' cannot be removed", existing.title),
        });
    }

    existing.clone().delete(db).await?;
    info!("Deleted reward '{}'", existing.title);
    Ok(Some(existing))
}

/// Locks or unlocks a reward for purchase. Returns None when it does not exist.
#[instrument(skip(db, guardian), fields(guardian_id = guardian.user_id()))]
pub async fn set_reward_locked(
    db: &DatabaseConnection,
    guardian: &Session,
    reward_id: &str,
    locked: bool,
) -> Result<Option<reward::Model>> {
    let Some(existing) = managed_reward(db, guardian, reward_id).await? else {
        return Ok(None);
    };

    let mut active: reward::ActiveModel = existing.into();
    active.is_locked = Set(locked);
    let updated = active.update(db).await?;
    info!("Reward '{}' locked: {}", updated.title, locked);
    Ok(Some(updated))
}

/// Finds a reward by id.
pub async fn get_reward_by_id(
    db: &DatabaseConnection,
    reward_id: &str,
) -> Result<Option<reward::Model>> {
    Reward::find_by_id(reward_id).one(db).await.map_err(Into::into)
}

/// A user's whole catalog, badges included, oldest first.
pub async fn get_rewards_for_user(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<reward::Model>> {
    Reward::find()
        .filter(reward::Column::UserId.eq(user_id))
        .order_by_asc(reward::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}
