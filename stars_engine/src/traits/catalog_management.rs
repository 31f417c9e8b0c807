use thiserror::Error;

use crate::db_types::{NewProduct, Product, ProductId, ProductUpdate, Stars};

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Prices must be positive. Got {0}")]
    InvalidPrice(Stars),
    #[error("Could not store the product asset. {0}")]
    AssetError(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

/// The `CatalogManagement` trait gives access to the authoritative product table.
///
/// New products receive the id `max(existing id) + 1`, or 1 for an empty table. Ids are therefore never reused while
/// a higher id exists, but the highest id is handed out again once its product has been deleted.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// All products, ordered by id.
    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError>;

    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, CatalogError>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError>;

    /// Applies a single-field update and returns the updated row.
    async fn update_product(&self, id: ProductId, update: ProductUpdate) -> Result<Product, CatalogError>;

    /// Deletes the product row and returns it. Purchase log rows referring to it are kept.
    async fn delete_product(&self, id: ProductId) -> Result<Product, CatalogError>;
}
