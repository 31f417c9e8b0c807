//! Balances, grants, notification preferences and statistics.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Deposit, NotificationFlags, NotificationKind, PurchaseRecord, ShopStats, Stars, UserId},
    shop_api::{shop_objects::Profile, DEFAULT_HISTORY_LIMIT},
    traits::{LedgerError, LedgerManagement},
};

pub struct LedgerApi<B> {
    db: B,
}

impl<B: Debug> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi ({:?})", self.db)
    }
}

impl<B> LedgerApi<B>
where B: LedgerManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Registers the user on first contact. Returns `true` if this is a new user.
    pub async fn start_session(&self, user: UserId) -> Result<bool, LedgerError> {
        let created = self.db.ensure_user(user).await?;
        if created {
            info!("💰️ New user #{user}");
            self.refresh_stats().await;
        }
        Ok(created)
    }

    pub async fn balance(&self, user: UserId) -> Result<Stars, LedgerError> {
        self.db.fetch_balance(user).await
    }

    /// Credits the user's balance on an administrator's say-so. Returns the new balance.
    pub async fn grant(&self, user: UserId, amount: Stars) -> Result<Stars, LedgerError> {
        let balance = self.db.credit(user, amount).await?;
        info!("💰️ Granted {amount} to user #{user}. Balance is now {balance}");
        self.refresh_stats().await;
        Ok(balance)
    }

    /// Debits the user's balance on an administrator's say-so. The balance is left untouched if it does not cover
    /// `amount`.
    pub async fn revoke(&self, user: UserId, amount: Stars) -> Result<Stars, LedgerError> {
        let balance = self.db.debit(user, amount).await?;
        info!("💰️ Revoked {amount} from user #{user}. Balance is now {balance}");
        self.refresh_stats().await;
        Ok(balance)
    }

    /// Recomputes the statistics and returns the fresh values.
    pub async fn stats(&self) -> Result<ShopStats, LedgerError> {
        self.db.recompute_stats().await
    }

    pub async fn notification_flags(&self, user: UserId) -> Result<NotificationFlags, LedgerError> {
        self.db.fetch_notification_flags(user).await
    }

    /// Flips one notification switch and returns the new flags.
    pub async fn toggle_notification(
        &self,
        user: UserId,
        kind: NotificationKind,
    ) -> Result<NotificationFlags, LedgerError> {
        let flags = self.db.fetch_notification_flags(user).await?.toggle(kind);
        self.db.set_notification_flags(user, flags).await?;
        debug!("💰️ User #{user} toggled {kind} notifications. Enabled: {}", flags.is_enabled(kind));
        Ok(flags)
    }

    /// Filters `candidates` down to those who want notifications of the given kind.
    pub async fn notification_recipients(
        &self,
        candidates: &[UserId],
        kind: NotificationKind,
    ) -> Result<Vec<UserId>, LedgerError> {
        let mut result = Vec::with_capacity(candidates.len());
        for user in candidates {
            if self.db.fetch_notification_flags(*user).await?.is_enabled(kind) {
                result.push(*user);
            }
        }
        Ok(result)
    }

    pub async fn profile(&self, user: UserId) -> Result<Profile, LedgerError> {
        let balance = self.db.fetch_balance(user).await?;
        let purchase_count = self.db.purchase_count(user).await?;
        Ok(Profile { user, balance, purchase_count })
    }

    pub async fn purchase_history(&self, user: UserId) -> Result<Vec<PurchaseRecord>, LedgerError> {
        self.db.purchase_history(user, DEFAULT_HISTORY_LIMIT).await
    }

    pub async fn deposit_history(&self, user: UserId) -> Result<Vec<Deposit>, LedgerError> {
        self.db.deposit_history(user, DEFAULT_HISTORY_LIMIT).await
    }

    async fn refresh_stats(&self) {
        if let Err(e) = self.db.recompute_stats().await {
            error!("💰️ Could not recompute the shop statistics. {e}");
        }
    }
}
