//! User entity - One row per account, guardian or child.
//!
//! Holds the mutable economic state of an explorer (gems, XP, level, streaks,
//! lifetime totals) next to the display fields. Friends and friend requests
//! live in their own tables.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier (UUID v4)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Unique login name
    #[sea_orm(unique)]
    pub username: String,
    /// Argon2 PHC string of the 4-digit PIN, never the PIN itself
    #[serde(skip_serializing)]
    pub pin_hash: String,
    /// `"guardian"` or `"child"`
    pub role: String,
    /// Managing guardian account for children, None for guardians
    pub guardian_id: Option<String>,
    /// Display name
    pub name: String,
    /// Age in years, 0 when not set up yet
    pub age: i32,
    /// `"boy"` or `"girl"`
    pub gender: String,
    /// Avatar reference (e.g. `"boy1"`)
    pub avatar_id: String,
    /// Spendable balance, never negative
    pub gems: i64,
    /// Sum of every positive gem event, never decreases
    pub lifetime_gems: i64,
    /// Experience points, never decreases
    pub xp: i64,
    /// Always `level_for_xp(xp)`
    pub level: i32,
    /// Consecutive daily check-ins
    pub streak: i32,
    /// Highest streak ever reached
    pub best_streak: i32,
    /// Rolling weekly counter, reset outside this crate
    pub gems_this_week: i64,
    /// Number of approved quests
    pub quests_completed: i32,
    /// Guardian-controlled lock flag
    pub sleep_mode: bool,
    /// Whether onboarding finished
    pub is_setup_complete: bool,
    /// Last day the daily reset ran
    pub last_login_date: Option<Date>,
    /// Last day the user checked in
    pub last_check_in_date: Option<Date>,
    /// Free-text profile motto
    pub motto: String,
    /// When the account was registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user owns many tasks
    #[sea_orm(has_many = "super::task::Entity")]
    Tasks,
    /// One user owns many rewards
    #[sea_orm(has_many = "super::reward::Entity")]
    Rewards,
    /// One user owns many gem transactions
    #[sea_orm(has_many = "super::gem_transaction::Entity")]
    GemTransactions,
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasks.def()
    }
}

impl Related<super::reward::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rewards.def()
    }
}

impl Related<super::gem_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GemTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
