//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod friend_request;
pub mod friendship;
pub mod gem_transaction;
pub mod reward;
pub mod task;
pub mod user;

// Re-export specific types to avoid conflicts
pub use friend_request::{
    Column as FriendRequestColumn, Entity as FriendRequest, Model as FriendRequestModel,
};
pub use friendship::{Column as FriendshipColumn, Entity as Friendship, Model as FriendshipModel};
pub use gem_transaction::{
    Column as GemTransactionColumn, Entity as GemTransaction, Model as GemTransactionModel,
};
pub use reward::{Column as RewardColumn, Entity as Reward, Model as RewardModel};
pub use task::{Column as TaskColumn, Entity as Task, Model as TaskModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
