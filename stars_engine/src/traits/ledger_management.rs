use thiserror::Error;

use crate::db_types::{
    Deposit,
    NotificationFlags,
    Product,
    Purchase,
    PurchaseRecord,
    ShopStats,
    Stars,
    UserAccount,
    UserId,
};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Insufficient funds. The balance is {balance}, but {required} is required")]
    InsufficientFunds { balance: Stars, required: Stars },
    #[error("Amounts must be positive. Got {0}")]
    InvalidAmount(Stars),
    #[error("Adding {0} would take the balance past the largest amount that can be stored")]
    Overflow(Stars),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

/// The `LedgerManagement` trait defines the balance and log operations of the shop.
///
/// Amounts handed to these methods are expected to have been validated by the caller. Implementations must
/// nevertheless refuse non-positive amounts with [`LedgerError::InvalidAmount`] and must never let a debit drive a
/// balance below zero, even when two debits for the same user race each other.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement {
    /// Creates the user row if it does not exist yet. Returns `true` if a new row was created.
    async fn ensure_user(&self, user: UserId) -> Result<bool, LedgerError>;

    /// Fetches the user row, if one exists. Never creates a row.
    async fn fetch_user(&self, user: UserId) -> Result<Option<UserAccount>, LedgerError>;

    /// The current balance. A missing user has a balance of zero, and no row is created.
    async fn fetch_balance(&self, user: UserId) -> Result<Stars, LedgerError>;

    /// Adds `amount` to the balance, creating the user row if necessary. Returns the new balance. Fails with
    /// [`LedgerError::Overflow`], leaving the balance untouched, if the sum does not fit in an `i64`.
    async fn credit(&self, user: UserId, amount: Stars) -> Result<Stars, LedgerError>;

    /// Removes `amount` from the balance in a single conditional update. Fails with
    /// [`LedgerError::InsufficientFunds`], leaving the balance untouched, if the balance is less than `amount`.
    /// Returns the new balance.
    async fn debit(&self, user: UserId, amount: Stars) -> Result<Stars, LedgerError>;

    /// Appends a purchase log row. Does not touch the balance.
    async fn record_purchase(&self, user: UserId, product: &Product) -> Result<Purchase, LedgerError>;

    /// Appends a deposit log row. Does not touch the balance.
    async fn record_deposit(&self, user: UserId, amount: Stars) -> Result<Deposit, LedgerError>;

    /// Debits the product price and appends the purchase log row in one atomic transaction.
    /// Returns the purchase and the new balance.
    async fn settle_purchase(&self, user: UserId, product: &Product) -> Result<(Purchase, Stars), LedgerError>;

    /// Credits `amount` and appends the deposit log row in one atomic transaction.
    /// Returns the deposit and the new balance.
    async fn settle_deposit(&self, user: UserId, amount: Stars) -> Result<(Deposit, Stars), LedgerError>;

    /// Recomputes the aggregate stats row from the source tables and returns the new values.
    async fn recompute_stats(&self) -> Result<ShopStats, LedgerError>;

    /// Reads the aggregate stats row as it was last computed.
    async fn fetch_stats(&self) -> Result<ShopStats, LedgerError>;

    /// The notification flags for the user. A missing user has the default flags, and no row is created.
    async fn fetch_notification_flags(&self, user: UserId) -> Result<NotificationFlags, LedgerError>;

    /// Overwrites the notification flags, creating the user row if necessary.
    async fn set_notification_flags(&self, user: UserId, flags: NotificationFlags) -> Result<(), LedgerError>;

    /// The number of purchases the user has ever made.
    async fn purchase_count(&self, user: UserId) -> Result<i64, LedgerError>;

    /// The user's most recent purchases, newest first.
    async fn purchase_history(&self, user: UserId, limit: i64) -> Result<Vec<PurchaseRecord>, LedgerError>;

    /// The user's most recent deposits, newest first.
    async fn deposit_history(&self, user: UserId, limit: i64) -> Result<Vec<Deposit>, LedgerError>;
}
