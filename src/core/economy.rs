//! Gem ledger - Guardian adjustments, reward purchases and daily check-ins.
//!
//! Each operation reads the profile, writes the new balance and appends one
//! log entry inside a single database transaction.

use crate::{
    auth::{self, Session},
    core::{
        badge,
        transaction::{NewTransaction, record_transaction},
    },
    entities::{Reward, User, gem_transaction, reward, user},
    errors::{Error, Result},
    models::{RewardType, TransactionType},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};

/// Gems for an ordinary check-in.
pub const DAILY_CHECK_IN_GEMS: i64 = 1;
/// Gems for a check-in that completes a streak week.
pub const WEEKLY_STREAK_GEMS: i64 = 10;
/// Streak length that earns the weekly bonus.
pub const STREAK_WEEK: i32 = 7;

/// Result of a manual adjustment.
#[derive(Debug, Clone)]
pub struct Adjustment {
    /// Profile after the adjustment
    pub user: user::Model,
    /// The `bonus` log entry, carrying the signed amount requested
    pub transaction: gem_transaction::Model,
    /// Badges unlocked by the new balance
    pub badges: Vec<reward::Model>,
}

/// Outcome of a purchase attempt. Only `Purchased` changed anything.
#[derive(Debug, Clone)]
pub enum PurchaseOutcome {
    /// Gems were debited and the reward is now owned
    Purchased {
        /// Profile after the debit
        user: user::Model,
        /// The purchased reward
        reward: reward::Model,
        /// The `reward` log entry
        transaction: gem_transaction::Model,
    },
    /// No such reward
    NotFound,
    /// Balance below the cost
    InsufficientGems {
        /// Current balance
        balance: i64,
        /// Reward cost
        cost: i64,
    },
    /// A guardian has locked the reward
    Locked,
    /// The reward was bought before
    AlreadyPurchased,
}

/// Result of a daily check-in that counted.
#[derive(Debug, Clone)]
pub struct CheckIn {
    /// Streak after the check-in
    pub streak: i32,
    /// Gems granted for it
    pub gems_awarded: i64,
    /// Profile after the check-in
    pub user: user::Model,
    /// The `streak` log entry
    pub transaction: gem_transaction::Model,
    /// Badges unlocked by the new balance
    pub badges: Vec<reward::Model>,
}

/// Gems granted for reaching `streak`.
#[must_use]
pub const fn check_in_award(streak: i32) -> i64 {
    if streak > 0 && streak % STREAK_WEEK == 0 {
        WEEKLY_STREAK_GEMS
    } else {
        DAILY_CHECK_IN_GEMS
    }
}

/// Applies a signed manual adjustment to a managed child's balance.
///
/// The balance never goes below zero, but the log entry carries the amount as
/// requested. Positive amounts also count toward lifetime and weekly gems.
/// Returns None when the child does not exist.
///
/// # Errors
/// - `Error::InvalidAmount` for a zero amount
/// - `Error::Unauthorized` unless `guardian` manages the child
#[instrument(skip(db, guardian), fields(guardian_id = guardian.user_id()))]
pub async fn adjust_gems(
    db: &DatabaseConnection,
    guardian: &Session,
    child_id: &str,
    amount: i64,
    reason: Option<&str>,
) -> Result<Option<Adjustment>> {
    if amount == 0 {
        return Err(Error::InvalidAmount { amount });
    }

    let txn = db.begin().await?;
    let Some(child) = User::find_by_id(child_id).one(&txn).await? else {
        return Ok(None);
    };
    auth::ensure_manages(guardian, &child)?;

    let new_balance = (child.gems + amount).max(0);

    let mut profile: user::ActiveModel = child.clone().into();
    profile.gems = Set(new_balance);
    if amount > 0 {
        profile.lifetime_gems = Set(child.lifetime_gems + amount);
        profile.gems_this_week = Set(child.gems_this_week + amount);
    }
    let user = profile.update(&txn).await?;

    let title = match reason.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => reason.to_string(),
        None if amount > 0 => "Gem Bonus".to_string(),
        None => "Gem Adjustment".to_string(),
    };
    let transaction = record_transaction(
        &txn,
        NewTransaction {
            user_id: &user.id,
            transaction_type: TransactionType::Bonus,
            amount,
            title,
            category: Some("Bonus"),
            icon: Some("💎"),
        },
    )
    .await?;

    let badges = badge::evaluate_badges(&txn, &user.id).await?;
    txn.commit().await?;

    info!(
        "Adjusted {} by {}, balance now {}",
        user.username, amount, user.gems
    );
    Ok(Some(Adjustment {
        user,
        transaction,
        badges,
    }))
}

/// Buys one of the session user's own rewards.
///
/// # Errors
/// `Error::Unauthorized` when the reward belongs to another account.
#[instrument(skip(db, child), fields(user_id = child.user_id()))]
pub async fn purchase_reward(
    db: &DatabaseConnection,
    child: &Session,
    reward_id: &str,
) -> Result<PurchaseOutcome> {
    let txn = db.begin().await?;

    let Some(item) = Reward::find_by_id(reward_id).one(&txn).await? else {
        return Ok(PurchaseOutcome::NotFound);
    };
    auth::ensure_owner(child, &item.user_id)?;
    let Some(buyer) = User::find_by_id(item.user_id.as_str()).one(&txn).await? else {
        return Err(Error::NoActiveSession);
    };

    if item.purchased {
        debug!("Reward {} already purchased", item.id);
        return Ok(PurchaseOutcome::AlreadyPurchased);
    }
    if item.is_locked {
        debug!("Reward {} is locked", item.id);
        return Ok(PurchaseOutcome::Locked);
    }
    if buyer.gems < item.cost {
        debug!("Balance {} below cost {}", buyer.gems, item.cost);
        return Ok(PurchaseOutcome::InsufficientGems {
            balance: buyer.gems,
            cost: item.cost,
        });
    }

    let cost = item.cost;
    let icon = if item.reward_type == RewardType::Badge.as_str() {
        "🎖"
    } else {
        "🎁"
    };

    let mut profile: user::ActiveModel = buyer.clone().into();
    profile.gems = Set(buyer.gems - cost);
    let user = profile.update(&txn).await?;

    let mut owned: reward::ActiveModel = item.into();
    owned.purchased = Set(true);
    owned.purchased_at = Set(Some(Utc::now()));
    let reward = owned.update(&txn).await?;

    let transaction = record_transaction(
        &txn,
        NewTransaction {
            user_id: &user.id,
            transaction_type: TransactionType::Reward,
            amount: -cost,
            title: reward.title.clone(),
            category: Some("Reward"),
            icon: Some(icon),
        },
    )
    .await?;

    txn.commit().await?;

    info!(
        "{} bought '{}' for {} gems, balance now {}",
        user.username, reward.title, cost, user.gems
    );
    Ok(PurchaseOutcome::Purchased {
        user,
        reward,
        transaction,
    })
}

/// Records the session user's daily check-in as of `today`.
///
/// Extends the streak by one and grants [`DAILY_CHECK_IN_GEMS`], or
/// [`WEEKLY_STREAK_GEMS`] when the new streak is a multiple of [`STREAK_WEEK`].
/// Returns None when the user already checked in on `today`.
#[instrument(skip(db, child), fields(user_id = child.user_id()))]
pub async fn mark_attendance_on(
    db: &DatabaseConnection,
    child: &Session,
    today: NaiveDate,
) -> Result<Option<CheckIn>> {
    let txn = db.begin().await?;

    let Some(current) = User::find_by_id(child.user_id()).one(&txn).await? else {
        return Err(Error::NoActiveSession);
    };
    if current.last_check_in_date == Some(today) {
        debug!("Already checked in on {}", today);
        return Ok(None);
    }

    let streak = current.streak + 1;
    let award = check_in_award(streak);

    let mut profile: user::ActiveModel = current.clone().into();
    profile.streak = Set(streak);
    profile.best_streak = Set(current.best_streak.max(streak));
    profile.gems = Set(current.gems + award);
    profile.lifetime_gems = Set(current.lifetime_gems + award);
    profile.last_check_in_date = Set(Some(today));
    let user = profile.update(&txn).await?;

    let transaction = record_transaction(
        &txn,
        NewTransaction {
            user_id: &user.id,
            transaction_type: TransactionType::Streak,
            amount: award,
            title: format!("{streak}-Day Streak"),
            category: Some("Bonus"),
            icon: Some("✨"),
        },
    )
    .await?;

    let badges = badge::evaluate_badges(&txn, &user.id).await?;
    txn.commit().await?;

    info!(
        "{} checked in on {}: streak {}, +{} gems",
        user.username, today, streak, award
    );
    Ok(Some(CheckIn {
        streak,
        gems_awarded: award,
        user,
        transaction,
        badges,
    }))
}

/// [`mark_attendance_on`] for the current UTC date.
pub async fn mark_attendance(db: &DatabaseConnection, child: &Session) -> Result<Option<CheckIn>> {
    mark_attendance_on(db, child, Utc::now().date_naive()).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{
        badge::get_badges_for_user,
        task::{approve_task, mark_complete, reject_task},
        transaction::{get_transactions_for_user, net_amount_for_user},
    };
    use crate::test_utils::*;

    #[test]
    fn test_check_in_award() {
        assert_eq!(check_in_award(1), 1);
        assert_eq!(check_in_award(6), 1);
        assert_eq!(check_in_award(7), 10);
        assert_eq!(check_in_award(8), 1);
        assert_eq!(check_in_award(14), 10);
    }

    #[tokio::test]
    async fn test_adjust_gems_bonus() -> Result<()> {
        let (db, _, guardian, child, _) = setup_household().await?;

        let adjustment = adjust_gems(&db, &guardian, &child.id, 120, None).await?.unwrap();

        assert_eq!(adjustment.user.gems, 120);
        assert_eq!(adjustment.user.lifetime_gems, 120);
        assert_eq!(adjustment.user.gems_this_week, 120);
        assert_eq!(adjustment.transaction.transaction_type, "bonus");
        assert_eq!(adjustment.transaction.amount, 120);
        assert_eq!(adjustment.transaction.title, "Gem Bonus");
        assert_eq!(adjustment.transaction.icon.as_deref(), Some("💎"));
        assert_eq!(adjustment.badges.len(), 1);
        assert_eq!(adjustment.badges[0].title, "Little Rebel");

        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_gems_floors_at_zero() -> Result<()> {
        let (db, _, guardian, child, _) = setup_household().await?;
        set_test_gems(&db, &child.id, 30).await?;

        let adjustment = adjust_gems(&db, &guardian, &child.id, -50, Some("Broke a window"))
            .await?
            .unwrap();

        assert_eq!(adjustment.user.gems, 0);
        // Lifetime total is untouched by deductions
        assert_eq!(adjustment.user.lifetime_gems, 30);
        // Logged as requested, not as clipped
        assert_eq!(adjustment.transaction.amount, -50);
        assert_eq!(adjustment.transaction.title, "Broke a window");

        let adjustment = adjust_gems(&db, &guardian, &child.id, -5, None).await?.unwrap();
        assert_eq!(adjustment.user.gems, 0);
        assert_eq!(adjustment.transaction.title, "Gem Adjustment");
        assert_eq!(adjustment.transaction.amount, -5);

        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_gems_rejects_zero_and_strangers() -> Result<()> {
        let (db, _, guardian, child, child_session) = setup_household().await?;
        let (_, stranger) = create_test_guardian(&db, "stranger").await?;

        let result = adjust_gems(&db, &guardian, &child.id, 0, None).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: 0 })));

        let result = adjust_gems(&db, &stranger, &child.id, 10, None).await;
        assert!(matches!(result, Err(Error::Unauthorized { reason: _ })));

        let result = adjust_gems(&db, &child_session, &child.id, 10, None).await;
        assert!(matches!(result, Err(Error::Unauthorized { reason: _ })));

        assert!(adjust_gems(&db, &guardian, "ghost", 10, None).await?.is_none());
        assert_eq!(reload_user(&db, &child.id).await?.gems, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_purchase_reward_scenario() -> Result<()> {
        let (db, _, guardian, child, child_session) = setup_household().await?;
        set_test_gems(&db, &child.id, 60).await?;
        let treat = create_test_reward(&db, &guardian, &child.id, "Ice Cream", 50).await?;

        let outcome = purchase_reward(&db, &child_session, &treat.id).await?;
        let PurchaseOutcome::Purchased {
            user,
            reward,
            transaction,
        } = outcome
        else {
            panic!("expected a purchase, got {outcome:?}");
        };

        assert_eq!(user.gems, 10);
        assert!(reward.purchased);
        assert!(reward.purchased_at.is_some());
        assert_eq!(transaction.transaction_type, "reward");
        assert_eq!(transaction.amount, -50);
        assert_eq!(transaction.icon.as_deref(), Some("🎁"));

        // Bought once only
        let outcome = purchase_reward(&db, &child_session, &treat.id).await?;
        assert!(matches!(outcome, PurchaseOutcome::AlreadyPurchased));
        assert_eq!(reload_user(&db, &child.id).await?.gems, 10);

        Ok(())
    }

    #[tokio::test]
    async fn test_purchase_reward_preconditions() -> Result<()> {
        let (db, _, guardian, child, child_session) = setup_household().await?;
        set_test_gems(&db, &child.id, 40).await?;
        let pricey = create_test_reward(&db, &guardian, &child.id, "Bike", 50).await?;

        let outcome = purchase_reward(&db, &child_session, &pricey.id).await?;
        assert!(matches!(
            outcome,
            PurchaseOutcome::InsufficientGems {
                balance: 40,
                cost: 50
            }
        ));

        let cheap = create_test_reward(&db, &guardian, &child.id, "Sticker", 5).await?;
        crate::core::reward::set_reward_locked(&db, &guardian, &cheap.id, true)
            .await?
            .unwrap();
        let outcome = purchase_reward(&db, &child_session, &cheap.id).await?;
        assert!(matches!(outcome, PurchaseOutcome::Locked));

        let outcome = purchase_reward(&db, &child_session, "missing").await?;
        assert!(matches!(outcome, PurchaseOutcome::NotFound));

        // Nothing moved
        assert_eq!(reload_user(&db, &child.id).await?.gems, 40);
        assert!(get_transactions_for_user(&db, &child.id).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_purchase_other_accounts_reward() -> Result<()> {
        let (db, _, guardian, child, _) = setup_household().await?;
        let (_, sibling) = create_test_child(&db, &guardian, "sibling").await?;
        let treat = create_test_reward(&db, &guardian, &child.id, "Ice Cream", 0).await?;

        let result = purchase_reward(&db, &sibling, &treat.id).await;
        assert!(matches!(result, Err(Error::Unauthorized { reason: _ })));

        Ok(())
    }

    #[tokio::test]
    async fn test_purchase_does_not_grant_badges() -> Result<()> {
        let (db, _, guardian, child, child_session) = setup_household().await?;
        set_test_gems(&db, &child.id, 150).await?;
        let treat = create_test_reward(&db, &guardian, &child.id, "Movie night", 20).await?;

        let outcome = purchase_reward(&db, &child_session, &treat.id).await?;
        assert!(matches!(outcome, PurchaseOutcome::Purchased { .. }));
        assert!(get_badges_for_user(&db, &child.id).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_mark_attendance_once_per_day() -> Result<()> {
        let (db, _, _, child, child_session) = setup_household().await?;
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        let check_in = mark_attendance_on(&db, &child_session, today).await?.unwrap();
        assert_eq!(check_in.streak, 1);
        assert_eq!(check_in.gems_awarded, 1);
        assert_eq!(check_in.user.gems, 1);
        assert_eq!(check_in.user.best_streak, 1);
        assert_eq!(check_in.transaction.title, "1-Day Streak");
        assert_eq!(check_in.transaction.category.as_deref(), Some("Bonus"));
        assert_eq!(check_in.transaction.icon.as_deref(), Some("✨"));

        assert!(mark_attendance_on(&db, &child_session, today).await?.is_none());
        let profile = reload_user(&db, &child.id).await?;
        assert_eq!(profile.streak, 1);
        assert_eq!(profile.gems, 1);
        assert_eq!(get_transactions_for_user(&db, &child.id).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_mark_attendance_week_bonus() -> Result<()> {
        let (db, _, _, child, child_session) = setup_household().await?;
        set_test_streak(&db, &child.id, 6).await?;
        set_test_gems(&db, &child.id, 95).await?;

        let today = NaiveDate::from_ymd_opt(2025, 6, 7).unwrap();
        let check_in = mark_attendance_on(&db, &child_session, today).await?.unwrap();

        assert_eq!(check_in.streak, 7);
        assert_eq!(check_in.gems_awarded, 10);
        assert_eq!(check_in.user.gems, 105);
        assert_eq!(check_in.user.best_streak, 7);
        assert_eq!(check_in.transaction.title, "7-Day Streak");
        assert_eq!(check_in.badges.len(), 1);

        let tomorrow = today.succ_opt().unwrap();
        let check_in = mark_attendance_on(&db, &child_session, tomorrow).await?.unwrap();
        assert_eq!(check_in.streak, 8);
        assert_eq!(check_in.gems_awarded, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_ledger_reconciles_with_balance() -> Result<()> {
        let (db, _, guardian, child, child_session) = setup_household().await?;
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        adjust_gems(&db, &guardian, &child.id, 80, None).await?.unwrap();
        mark_attendance_on(&db, &child_session, today).await?.unwrap();

        let approved = create_test_task(&db, &guardian, &child.id, 10, false).await?;
        mark_complete(&db, &child_session, &approved.id).await?.unwrap();
        approve_task(&db, &guardian, &approved.id).await?.unwrap();

        let rejected = create_test_task(&db, &guardian, &child.id, 25, false).await?;
        mark_complete(&db, &child_session, &rejected.id).await?.unwrap();
        reject_task(&db, &guardian, &rejected.id).await?.unwrap();

        let treat = create_test_reward(&db, &guardian, &child.id, "Comic", 30).await?;
        purchase_reward(&db, &child_session, &treat.id).await?;
        adjust_gems(&db, &guardian, &child.id, -20, None).await?.unwrap();
        adjust_gems(&db, &guardian, &child.id, 7, None).await?.unwrap();

        let profile = reload_user(&db, &child.id).await?;
        assert_eq!(profile.gems, 48);
        assert_eq!(net_amount_for_user(&db, &child.id).await?, profile.gems);
        assert_eq!(get_transactions_for_user(&db, &child.id).await?.len(), 6);

        Ok(())
    }

    #[tokio::test]
    async fn test_badge_survives_purchase_below_threshold() -> Result<()> {
        let (db, _, guardian, child, child_session) = setup_household().await?;

        let quest = create_test_task(&db, &guardian, &child.id, 120, false).await?;
        mark_complete(&db, &child_session, &quest.id).await?.unwrap();
        let approval = approve_task(&db, &guardian, &quest.id).await?.unwrap();
        assert_eq!(approval.badges.len(), 1);
        assert_eq!(approval.badges[0].badge_key.as_deref(), Some("b1"));
        assert_eq!(approval.user.lifetime_gems, 120);

        let bike = create_test_reward(&db, &guardian, &child.id, "Bike bell", 50).await?;
        let outcome = purchase_reward(&db, &child_session, &bike.id).await?;
        let PurchaseOutcome::Purchased { user, .. } = outcome else {
            panic!("expected a purchase, got {outcome:?}");
        };
        assert_eq!(user.gems, 70);
        // Spending never touches the lifetime total
        assert_eq!(user.lifetime_gems, 120);

        let badges = get_badges_for_user(&db, &child.id).await?;
        assert_eq!(badges.len(), 1);
        assert_eq!(badges[0].badge_key.as_deref(), Some("b1"));

        Ok(())
    }
}
