use crate::traits::{CatalogManagement, LedgerManagement};

/// A backend that can serve every part of the shop engine.
#[allow(async_fn_in_trait)]
pub trait StoreDatabase: Clone + LedgerManagement + CatalogManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Closes the underlying connection pool.
    async fn close(&mut self);
}
