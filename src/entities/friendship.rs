//! Friendship entity - One row per direction of a confirmed friendship.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Friendship database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "friendships")]
pub struct Model {
    /// Account whose friend list this row belongs to
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// The friend
    #[sea_orm(primary_key, auto_increment = false)]
    pub friend_id: String,
    /// When the friendship was confirmed
    pub created_at: DateTimeUtc,
}

/// `Friendship` references users by id only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
