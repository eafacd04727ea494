//! Transaction log - Append-only history of every gem movement.
//!
//! Rows are written only from inside the operation that moved the gems, on the
//! same database transaction, so a balance change and its log entry commit
//! together. There is no update or delete path.

use crate::{
    entities::{GemTransaction, gem_transaction},
    errors::Result,
    models::TransactionType,
};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::debug;
use uuid::Uuid;

/// Fields of a log entry that the caller chooses.
#[derive(Debug, Clone)]
pub(crate) struct NewTransaction<'a> {
    pub(crate) user_id: &'a str,
    pub(crate) transaction_type: TransactionType,
    pub(crate) amount: i64,
    pub(crate) title: String,
    pub(crate) category: Option<&'a str>,
    pub(crate) icon: Option<&'a str>,
}

/// Appends one entry to the log.
pub(crate) async fn record_transaction<C>(
    conn: &C,
    entry: NewTransaction<'_>,
) -> Result<gem_transaction::Model>
where
    C: ConnectionTrait,
{
    let model = gem_transaction::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user_id: Set(entry.user_id.to_string()),
        transaction_type: Set(entry.transaction_type.as_str().to_string()),
        amount: Set(entry.amount),
        title: Set(entry.title),
        category: Set(entry.category.map(str::to_string)),
        icon: Set(entry.icon.map(str::to_string)),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?;

    debug!(
        "Logged {} transaction {} for {}: {:+}",
        model.transaction_type, model.id, model.user_id, model.amount
    );
    Ok(model)
}

/// Retrieves a user's history, newest first.
pub async fn get_transactions_for_user(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<gem_transaction::Model>> {
    GemTransaction::find()
        .filter(gem_transaction::Column::UserId.eq(user_id))
        .order_by_desc(gem_transaction::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sum of every logged amount for a user. Equals the user's net gem change
/// since registration.
pub async fn net_amount_for_user(db: &DatabaseConnection, user_id: &str) -> Result<i64> {
    Ok(get_transactions_for_user(db, user_id)
        .await?
        .iter()
        .map(|t| t.amount)
        .sum())
}

/// Gems earned and spent on one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySummary {
    /// The day summarised
    pub day: NaiveDate,
    /// Sum of positive amounts
    pub earned: i64,
    /// Sum of negative amounts, as a positive number
    pub spent: i64,
    /// Entries logged that day, newest first
    pub transactions: Vec<gem_transaction::Model>,
}

/// Builds the guardian history header for one day.
pub async fn daily_summary(
    db: &DatabaseConnection,
    user_id: &str,
    day: NaiveDate,
) -> Result<DailySummary> {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::days(1);

    let transactions = GemTransaction::find()
        .filter(gem_transaction::Column::UserId.eq(user_id))
        .filter(gem_transaction::Column::CreatedAt.gte(start))
        .filter(gem_transaction::Column::CreatedAt.lt(end))
        .order_by_desc(gem_transaction::Column::CreatedAt)
        .all(db)
        .await?;

    let earned = transactions.iter().filter(|t| t.amount > 0).map(|t| t.amount).sum();
    let spent = transactions
        .iter()
        .filter(|t| t.amount < 0)
        .map(|t| -t.amount)
        .sum();

    Ok(DailySummary {
        day,
        earned,
        spent,
        transactions,
    })
}
