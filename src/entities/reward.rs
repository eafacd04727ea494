//! Reward entity - Catalog entries owned by a user.
//!
//! Guardians create vouchers and items; the badge evaluator creates badges,
//! which are born purchased and cost nothing.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reward database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rewards")]
pub struct Model {
    /// Unique identifier (UUID v4)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning child account
    pub user_id: String,
    /// Display title
    pub title: String,
    /// Optional tagline (e.g. "Gold Tier")
    pub subtitle: Option<String>,
    /// Price in gems
    pub cost: i64,
    /// Emoji or image URL
    pub image: String,
    /// `"badge"`, `"voucher"` or `"item"`
    pub reward_type: String,
    /// Set once by a purchase or a badge grant, never cleared
    pub purchased: bool,
    /// When it was purchased or granted
    pub purchased_at: Option<DateTimeUtc>,
    /// Locked rewards cannot be bought
    pub is_locked: bool,
    /// Badge table key (`"b1"`..) for system badges
    pub badge_key: Option<String>,
    /// When the entry was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Reward and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each reward belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
