//! Badge evaluator - Grants achievement badges from the current gem balance.
//!
//! Badges are ordinary reward rows of type `badge`, born purchased at zero
//! cost. Evaluation only ever inserts: a badge stays once granted, even when
//! the balance later drops below its threshold.

use crate::{
    entities::{Reward, User, reward},
    errors::Result,
    models::RewardType,
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

/// One row of the fixed badge table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeDefinition {
    /// Stable key stored on granted rewards
    pub key: &'static str,
    /// Gem balance that unlocks the badge
    pub threshold: i64,
    /// Badge title
    pub title: &'static str,
    /// Tagline
    pub subtitle: &'static str,
    /// Artwork path
    pub image: &'static str,
}

const fn badge(
    key: &'static str,
    threshold: i64,
    title: &'static str,
    subtitle: &'static str,
    image: &'static str,
) -> BadgeDefinition {
    BadgeDefinition {
        key,
        threshold,
        title,
        subtitle,
        image,
    }
}

/// Badge table in ascending threshold order.
pub static BADGES: [BadgeDefinition; 10] = [
    badge("b1", 100, "Little Rebel", "Start the journey", "/achievements/Little Rebel.png"),
    badge("b2", 250, "Junior Jai Lava Kusa", "Balancing tasks", "/achievements/Junior Jai Lava Kusa.png"),
    badge("b3", 500, "Focus Srimanthudu", "Wealth of focus", "/achievements/Focus Srimanthudu.png"),
    badge("b4", 1000, "Gabbar Singh Speed", "High energy & speed", "/achievements/Gabbar Singh Speed.png"),
    badge("b5", 1750, "Discipline Dhruva", "Logic beats distractions", "/achievements/Discipline Dhruva.png"),
    badge("b6", 2500, "Thaggede Le", "Never give up", "/achievements/Thaggede Le.png"),
    badge("b7", 5000, "Devara of Focus", "Master of routine", "/achievements/Devara of Focus.png"),
    badge("b8", 6000, "Salaar Ceasefire", "Total silence in Zen", "/achievements/Salaar Ceasefire.png"),
    badge("b9", 7500, "Jai Mahishmati", "Unbreakable streak", "/achievements/Jai Mahishmati.png"),
    badge("b10", 10000, "Global Game Changer", "Lifestyle transformation", "/achievements/Global Game Changer.png"),
];

/// Badges whose threshold a balance of `gems` meets.
pub fn badges_unlocked_by(gems: i64) -> impl Iterator<Item = &'static BadgeDefinition> {
    BADGES.iter().take_while(move |b| b.threshold <= gems)
}

/// Looks up a badge definition by key.
#[must_use]
pub fn badge_by_key(key: &str) -> Option<&'static BadgeDefinition> {
    BADGES.iter().find(|b| b.key == key)
}

/// Grants every badge the user's current balance unlocks and they do not hold
/// yet. Returns the newly created badge rewards; a missing user yields none.
pub async fn evaluate_badges<C>(conn: &C, user_id: &str) -> Result<Vec<reward::Model>>
where
    C: ConnectionTrait,
{
    let Some(user) = User::find_by_id(user_id).one(conn).await? else {
        return Ok(Vec::new());
    };

    let held: HashSet<String> = Reward::find()
        .filter(reward::Column::UserId.eq(user_id))
        .filter(reward::Column::RewardType.eq(RewardType::Badge.as_str()))
        .all(conn)
        .await?
        .into_iter()
        .filter_map(|r| r.badge_key)
        .collect();

    let mut granted = Vec::new();
    for badge in badges_unlocked_by(user.gems).filter(|b| !held.contains(b.key)) {
        let now = Utc::now();
        let model = reward::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            title: Set(badge.title.to_string()),
            subtitle: Set(Some(badge.subtitle.to_string())),
            cost: Set(0),
            image: Set(badge.image.to_string()),
            reward_type: Set(RewardType::Badge.as_str().to_string()),
            purchased: Set(true),
            purchased_at: Set(Some(now)),
            is_locked: Set(false),
            badge_key: Set(Some(badge.key.to_string())),
            created_at: Set(now),
        }
        .insert(conn)
        .await?;

        info!("{} unlocked badge '{}'", user.username, badge.title);
        granted.push(model);
    }

    Ok(granted)
}

/// Badges a user holds, in the order they were granted.
pub async fn get_badges_for_user(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<reward::Model>> {
    Reward::find()
        .filter(reward::Column::UserId.eq(user_id))
        .filter(reward::Column::RewardType.eq(RewardType::Badge.as_str()))
        .order_by_asc(reward::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}
