//! `SqliteDatabase` is the SQLite backend of the shop engine.
//!
//! It implements every trait in [`crate::traits`]. Multi-step ledger writes (a purchase debits the balance and
//! appends to the purchase log) are performed inside a single transaction.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{
    db::{db_url, deposits, new_pool, products, purchases, stats, users},
    SqliteDatabaseError,
};
use crate::{
    db_types::{
        Deposit,
        NewProduct,
        NotificationFlags,
        Product,
        ProductId,
        ProductUpdate,
        Purchase,
        PurchaseRecord,
        ShopStats,
        Stars,
        UserAccount,
        UserId,
    },
    traits::{CatalogError, CatalogManagement, LedgerError, LedgerManagement, StoreDatabase},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

fn check_positive(amount: Stars) -> Result<(), LedgerError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount(amount))
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn ensure_user(&self, user: UserId) -> Result<bool, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let created = users::ensure_user(user, &mut conn).await?;
        Ok(created)
    }

    async fn fetch_user(&self, user: UserId) -> Result<Option<UserAccount>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let account = users::user_by_id(user, &mut conn).await?;
        Ok(account)
    }

    async fn fetch_balance(&self, user: UserId) -> Result<Stars, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let balance = users::balance(user, &mut conn).await?;
        Ok(balance)
    }

    async fn credit(&self, user: UserId, amount: Stars) -> Result<Stars, LedgerError> {
        check_positive(amount)?;
        let mut conn = self.pool.acquire().await?;
        let balance = users::credit(user, amount, &mut conn).await?.ok_or(LedgerError::Overflow(amount))?;
        debug!("💰️ Credited {amount} to user #{user}");
        Ok(balance)
    }

    async fn debit(&self, user: UserId, amount: Stars) -> Result<Stars, LedgerError> {
        check_positive(amount)?;
        let mut conn = self.pool.acquire().await?;
        match users::try_debit(user, amount, &mut conn).await? {
            Some(balance) => {
                debug!("💰️ Debited {amount} from user #{user}");
                Ok(balance)
            },
            None => {
                let balance = users::balance(user, &mut conn).await?;
                Err(LedgerError::InsufficientFunds { balance, required: amount })
            },
        }
    }

    async fn record_purchase(&self, user: UserId, product: &Product) -> Result<Purchase, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let purchase = purchases::insert(user, product, &mut conn).await?;
        Ok(purchase)
    }

    async fn record_deposit(&self, user: UserId, amount: Stars) -> Result<Deposit, LedgerError> {
        check_positive(amount)?;
        let mut conn = self.pool.acquire().await?;
        let deposit = deposits::insert(user, amount, &mut conn).await?;
        Ok(deposit)
    }

    async fn settle_purchase(&self, user: UserId, product: &Product) -> Result<(Purchase, Stars), LedgerError> {
        check_positive(product.price)?;
        let mut tx = self.pool.begin().await?;
        let balance = match users::try_debit(user, product.price, &mut tx).await? {
            Some(b) => b,
            None => {
                let balance = users::balance(user, &mut tx).await?;
                tx.rollback().await?;
                debug!("💰️ User #{user} cannot afford product #{} ({balance} < {})", product.id, product.price);
                return Err(LedgerError::InsufficientFunds { balance, required: product.price });
            },
        };
        let purchase = purchases::insert(user, product, &mut tx).await?;
        tx.commit().await?;
        info!("💰️ User #{user} bought product #{} for {}. Balance is now {balance}", product.id, product.price);
        Ok((purchase, balance))
    }

    async fn settle_deposit(&self, user: UserId, amount: Stars) -> Result<(Deposit, Stars), LedgerError> {
        check_positive(amount)?;
        let mut tx = self.pool.begin().await?;
        let Some(balance) = users::credit(user, amount, &mut tx).await? else {
            tx.rollback().await?;
            warn!("💰️ Deposit of {amount} by user #{user} would overflow the balance");
            return Err(LedgerError::Overflow(amount));
        };
        let deposit = deposits::insert(user, amount, &mut tx).await?;
        tx.commit().await?;
        info!("💰️ User #{user} deposited {amount}. Balance is now {balance}");
        Ok((deposit, balance))
    }

    async fn recompute_stats(&self) -> Result<ShopStats, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let stats = stats::recompute(&mut conn).await?;
        trace!("🗃️ Stats recomputed: {stats:?}");
        Ok(stats)
    }

    async fn fetch_stats(&self) -> Result<ShopStats, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        match stats::fetch(&mut conn).await? {
            Some(stats) => Ok(stats),
            None => {
                warn!("🗃️ The stats row is missing. Recomputing it.");
                let stats = stats::recompute(&mut conn).await?;
                Ok(stats)
            },
        }
    }

    async fn fetch_notification_flags(&self, user: UserId) -> Result<NotificationFlags, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let flags = users::notification_flags(user, &mut conn).await?;
        Ok(flags.unwrap_or_default())
    }

    async fn set_notification_flags(&self, user: UserId, flags: NotificationFlags) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        users::set_notification_flags(user, flags, &mut conn).await?;
        debug!("💰️ Notification flags for user #{user} set to {}", flags.value());
        Ok(())
    }

    async fn purchase_count(&self, user: UserId) -> Result<i64, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let count = purchases::count_for_user(user, &mut conn).await?;
        Ok(count)
    }

    async fn purchase_history(&self, user: UserId, limit: i64) -> Result<Vec<PurchaseRecord>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let history = purchases::history(user, limit, &mut conn).await?;
        Ok(history)
    }

    async fn deposit_history(&self, user: UserId, limit: i64) -> Result<Vec<Deposit>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let history = deposits::history(user, limit, &mut conn).await?;
        Ok(history)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::fetch_all(&mut conn).await?;
        Ok(products)
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_by_id(id, &mut conn).await?;
        Ok(product)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        if !product.price.is_positive() {
            return Err(CatalogError::InvalidPrice(product.price));
        }
        let mut conn = self.pool.acquire().await?;
        let product = products::insert(product, &mut conn).await?;
        Ok(product)
    }

    async fn update_product(&self, id: ProductId, update: ProductUpdate) -> Result<Product, CatalogError> {
        if let ProductUpdate::Price(price) = &update {
            if !price.is_positive() {
                return Err(CatalogError::InvalidPrice(*price));
            }
        }
        let mut conn = self.pool.acquire().await?;
        products::update(id, update, &mut conn).await?.ok_or(CatalogError::ProductNotFound(id))
    }

    async fn delete_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        products::delete(id, &mut conn).await?.ok_or(CatalogError::ProductNotFound(id))
    }
}

impl StoreDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) {
        self.pool.close().await;
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in the `STARS_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
