//! Session and credential handling.
//!
//! A [`Session`] is the explicit identity every user-scoped operation takes.
//! `login` and `register` hand one out, `logout` consumes it. PINs are stored
//! as Argon2 hashes and verified with a constant-time comparison; the plain
//! PIN never reaches the database.

use crate::{
    config::quests::QuestConfig,
    core::task,
    entities::{User, user},
    errors::{Error, Result},
    models::{Gender, Role},
};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Request-scoped identity of the signed-in account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: String,
    role: Role,
}

impl Session {
    pub(crate) fn for_user(profile: &user::Model) -> Result<Self> {
        Ok(Self {
            user_id: profile.id.clone(),
            role: profile.role.parse()?,
        })
    }

    /// Id of the signed-in account.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Role of the signed-in account.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Fails unless the session belongs to a guardian.
    pub fn require_guardian(&self) -> Result<()> {
        if self.role == Role::Guardian {
            Ok(())
        } else {
            Err(Error::Unauthorized {
                reason: "guardian access required".to_string(),
            })
        }
    }
}

/// Fails unless `guardian` is the guardian account that manages `child`.
pub fn ensure_manages(guardian: &Session, child: &user::Model) -> Result<()> {
    guardian.require_guardian()?;
    if child.guardian_id.as_deref() == Some(guardian.user_id()) {
        Ok(())
    } else {
        Err(Error::Unauthorized {
            reason: format!("{} is not managed by this guardian", child.username),
        })
    }
}

/// Fails unless the session belongs to the account that owns a record.
pub(crate) fn ensure_owner(session: &Session, owner_id: &str) -> Result<()> {
    if session.user_id() == owner_id {
        Ok(())
    } else {
        Err(Error::Unauthorized {
            reason: "record belongs to another account".to_string(),
        })
    }
}

/// Loads the profile behind a session.
///
/// # Errors
/// `Error::NoActiveSession` when the account no longer exists.
pub async fn current_user(db: &DatabaseConnection, session: &Session) -> Result<user::Model> {
    User::find_by_id(session.user_id())
        .one(db)
        .await?
        .ok_or(Error::NoActiveSession)
}

/// Everything needed to open an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Unique login name
    pub username: String,
    /// Four-digit PIN
    pub pin: String,
    /// Guardian or child
    pub role: Role,
    /// Display name, defaults to the username
    pub name: Option<String>,
    /// Age in years
    pub age: i32,
    /// Avatar gender
    pub gender: Gender,
    /// Avatar reference, defaults to `"boy1"`
    pub avatar_id: Option<String>,
    /// Managing guardian for child accounts
    pub guardian_id: Option<String>,
}

impl NewAccount {
    /// A minimal account with default display fields.
    #[must_use]
    pub fn new(username: impl Into<String>, pin: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            pin: pin.into(),
            role,
            name: None,
            age: 0,
            gender: Gender::Boy,
            avatar_id: None,
            guardian_id: None,
        }
    }
}

fn validate_pin(pin: &str) -> Result<()> {
    if pin.len() == 4 && pin.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(Error::InvalidPin)
    }
}

fn hash_pin(pin: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(pin.as_bytes(), &salt)?
        .to_string())
}

fn verify_pin(pin: &str, pin_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(pin_hash)?;
    Ok(Argon2::default()
        .verify_password(pin.as_bytes(), &parsed)
        .is_ok())
}

/// Opens an account and signs it in.
///
/// Child accounts are seeded with `default_quests`. When `guardian_id` is given it
/// must name an existing guardian account.
///
/// # Errors
/// - `Error::Validation` for an empty username or a guardian that is not one
/// - `Error::InvalidPin` unless the PIN is exactly four digits
/// - `Error::UsernameTaken` when the username exists
/// - `Error::UserNotFound` when `guardian_id` does not exist
#[instrument(skip(db, account, default_quests), fields(username = %account.username))]
pub async fn register(
    db: &DatabaseConnection,
    account: NewAccount,
    default_quests: &[QuestConfig],
) -> Result<(user::Model, Session)> {
    let username = account.username.trim().to_string();
    if username.is_empty() {
        return Err(Error::Validation {
            message: "Username cannot be empty".to_string(),
        });
    }
    validate_pin(&account.pin)?;

    if User::find()
        .filter(user::Column::Username.eq(username.as_str()))
        .one(db)
        .await?
        .is_some()
    {
        return Err(Error::UsernameTaken { username });
    }

    if let Some(guardian_id) = &account.guardian_id {
        let guardian = User::find_by_id(guardian_id.as_str())
            .one(db)
            .await?
            .ok_or_else(|| Error::UserNotFound {
                id: guardian_id.clone(),
            })?;
        if guardian.role != Role::Guardian.as_str() {
            return Err(Error::Validation {
                message: format!("{} is not a guardian account", guardian.username),
            });
        }
    }

    let pin_hash = hash_pin(&account.pin)?;
    let txn = db.begin().await?;

    let profile = user::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(account.name.unwrap_or_else(|| username.clone())),
        username: Set(username),
        pin_hash: Set(pin_hash),
        role: Set(account.role.as_str().to_string()),
        guardian_id: Set(account.guardian_id),
        age: Set(account.age),
        gender: Set(account.gender.as_str().to_string()),
        avatar_id: Set(account.avatar_id.unwrap_or_else(|| "boy1".to_string())),
        gems: Set(0),
        lifetime_gems: Set(0),
        xp: Set(0),
        level: Set(1),
        streak: Set(0),
        best_streak: Set(0),
        gems_this_week: Set(0),
        quests_completed: Set(0),
        sleep_mode: Set(false),
        is_setup_complete: Set(false),
        last_login_date: Set(None),
        last_check_in_date: Set(None),
        motto: Set(String::new()),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(&txn)
    .await?;

    if account.role == Role::Child {
        task::seed_default_tasks(&txn, &profile.id, default_quests).await?;
    }

    txn.commit().await?;

    let session = Session::for_user(&profile)?;
    info!(
        "Registered {} account {} ({})",
        account.role, profile.username, profile.id
    );
    Ok((profile, session))
}

/// Signs in with username and PIN. Wrong credentials yield `Ok(None)`.
#[instrument(skip(db, pin))]
pub async fn login(db: &DatabaseConnection, username: &str, pin: &str) -> Result<Option<Session>> {
    let Some(profile) = User::find()
        .filter(user::Column::Username.eq(username.trim()))
        .one(db)
        .await?
    else {
        debug!("Login for unknown username");
        return Ok(None);
    };

    if !verify_pin(pin, &profile.pin_hash)? {
        warn!("Wrong PIN for {}", profile.username);
        return Ok(None);
    }

    info!("{} signed in", profile.username);
    Session::for_user(&profile).map(Some)
}

/// Ends a session.
pub fn logout(session: Session) {
    info!("{} signed out", session.user_id);
}
