//! Task entity - One row per quest instance.
//!
//! Tasks move `pending -> completed` on the child's action and back to
//! `pending` (recurring) or out of the table (one-time) on approval.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Task database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    /// Unique identifier (UUID v4)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning child account
    pub user_id: String,
    /// Short quest title (e.g. "Brush Teeth")
    pub title: String,
    /// Optional longer description
    pub description: Option<String>,
    /// One of the eight `TaskCategory` spellings
    pub category: String,
    /// Gems granted on approval
    pub reward: i64,
    /// XP granted on approval
    pub xp: i64,
    /// `"pending"`, `"completed"` or `"approved"`
    pub status: String,
    /// Daily habit: comes back as pending after approval
    pub is_recurring: bool,
    /// Optional picture for visual quests
    pub image: Option<String>,
    /// When the quest was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Task and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each task belongs to one user
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
