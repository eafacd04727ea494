//! Friend request entity - Requests addressed to a recipient.
//!
//! Sender display fields are copied in so the recipient's inbox renders
//! without a join. Resolved requests keep their terminal status.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Friend request database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "friend_requests")]
pub struct Model {
    /// Unique identifier (UUID v4)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Sender account
    pub from_user_id: String,
    /// Sender username at send time
    pub from_username: String,
    /// Sender display name at send time
    pub from_name: String,
    /// Sender avatar at send time
    pub from_avatar_id: String,
    /// Recipient account
    pub to_user_id: String,
    /// `"pending"`, `"accepted"` or `"ignored"`
    pub status: String,
    /// When it was sent
    pub created_at: DateTimeUtc,
    /// When the recipient answered
    pub responded_at: Option<DateTimeUtc>,
}

/// `FriendRequest` references users by id only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
