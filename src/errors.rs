//! Unified error type for the gem economy.
//!
//! State-machine precondition failures (approving a task that is not
//! completed, buying without enough gems, a second check-in on the same
//! day) are NOT errors: operations report them through `Option` or an
//! outcome enum. Only infrastructure, authentication and input problems
//! end up here.

use thiserror::Error;

/// All errors surfaced by `GemQuest` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable cause
        message: String,
    },

    /// The backing store could not be reached or opened
    #[error("Store unavailable: {message}")]
    StoreUnavailable {
        /// Human-readable cause
        message: String,
    },

    /// A query against the store failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A user-scoped action was attempted without a live session
    #[error("No active session")]
    NoActiveSession,

    /// The session is valid but may not perform this action
    #[error("Unauthorized: {reason}")]
    Unauthorized {
        /// Why the action was refused
        reason: String,
    },

    /// A referenced user does not exist where the caller requires one
    #[error("User not found: {id}")]
    UserNotFound {
        /// The id or username that was looked up
        id: String,
    },

    /// Registration with a username that is already taken
    #[error("Username already taken: {username}")]
    UsernameTaken {
        /// The rejected username
        username: String,
    },

    /// PIN is not exactly four ASCII digits
    #[error("PIN must be exactly 4 digits")]
    InvalidPin,

    /// PIN hashing or hash parsing failed
    #[error("PIN hashing failed: {0}")]
    PinHash(String),

    /// A gem amount that makes no sense for the operation
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: i64,
    },

    /// Input failed a field-level validation rule
    #[error("Validation error: {message}")]
    Validation {
        /// Which rule failed
        message: String,
    },

    /// I/O failure (config files and the like)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable lookup failed
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl From<argon2::password_hash::Error> for Error {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self::PinHash(value.to_string())
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
