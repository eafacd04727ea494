//! Gem transaction entity - Append-only audit log of every gem movement.
//!
//! Each row has a `user_id`, a signed `amount` (positive credit, negative
//! debit), a `transaction_type` (task/streak/bonus/reward) and display fields.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Gem transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gem_transactions")]
pub struct Model {
    /// Unique identifier (UUID v4)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Account whose balance moved
    pub user_id: String,
    /// `"task"`, `"streak"`, `"bonus"` or `"reward"`
    pub transaction_type: String,
    /// Signed gem amount
    pub amount: i64,
    /// Display title (quest title, "7-Day Streak", reward title...)
    pub title: String,
    /// Optional grouping label (e.g. "Daily Task")
    pub category: Option<String>,
    /// Optional emoji
    pub icon: Option<String>,
    /// When the movement happened
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `GemTransaction` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one user
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
