//! The catalog service.
//!
//! `CatalogApi` is the only writer of the catalog cache. Every mutation goes to the record store first and then
//! replaces the cached snapshot wholesale from the product table. Browsing reads the snapshot and never touches the
//! record store.
use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    assets::AssetStore,
    catalog_cache::{CatalogCache, CatalogSnapshot},
    db_types::{NewProduct, Product, ProductId, ProductUpdate},
    traits::{CatalogError, CatalogManagement},
};

#[derive(Clone)]
pub struct CatalogApi<B> {
    db: B,
    cache: Arc<CatalogCache>,
    assets: AssetStore,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?}, {} products)", self.db, self.cache.len())
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    /// Creates the service with an empty cache. Call [`Self::reload`] before serving requests.
    pub fn new(db: B, assets: AssetStore) -> Self {
        Self { db, cache: Arc::new(CatalogCache::new()), assets }
    }

    /// A handle to the cache, for components that only ever read the catalog.
    pub fn cache(&self) -> Arc<CatalogCache> {
        Arc::clone(&self.cache)
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// Replaces the cached snapshot with the current contents of the product table.
    pub async fn reload(&self) -> Result<usize, CatalogError> {
        let products = self.db.fetch_products().await?;
        let count = products.len();
        self.cache.replace(products);
        debug!("📦️ Catalog reloaded with {count} products");
        Ok(count)
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        self.cache.snapshot()
    }

    pub fn products(&self) -> Vec<Product> {
        self.cache.products()
    }

    pub fn product(&self, id: ProductId) -> Option<Product> {
        self.cache.get(id)
    }

    /// Writes an uploaded file to the asset store and returns its reference.
    pub async fn store_asset(&self, handle: &str, file_name: &str, contents: &[u8]) -> Result<String, CatalogError> {
        self.assets.store(handle, file_name, contents).await.map_err(|e| CatalogError::AssetError(e.to_string()))
    }

    pub async fn add_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        let product = self.db.insert_product(product).await?;
        info!("📦️ Product #{} ({}) added at {}", product.id, product.name, product.price);
        self.reload().await?;
        Ok(product)
    }

    /// Overwrites one text or price field. File replacement goes through [`Self::replace_asset`].
    pub async fn update_product(&self, id: ProductId, update: ProductUpdate) -> Result<Product, CatalogError> {
        let field = update.field();
        let product = self.db.update_product(id, update).await?;
        info!("📦️ Product #{id} {field} updated");
        self.reload().await?;
        Ok(product)
    }

    /// Swaps the product's file. The previous file is removed first, best-effort.
    pub async fn replace_asset(
        &self,
        id: ProductId,
        handle: &str,
        file_name: &str,
        contents: &[u8],
    ) -> Result<Product, CatalogError> {
        let existing = self.db.fetch_product(id).await?.ok_or(CatalogError::ProductNotFound(id))?;
        self.assets.remove(&existing.asset_ref).await;
        let asset_ref = self.store_asset(handle, file_name, contents).await?;
        self.update_product(id, ProductUpdate::Asset(asset_ref)).await
    }

    /// Removes the product's file (best-effort) and its row.
    pub async fn delete_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let existing = self.db.fetch_product(id).await?.ok_or(CatalogError::ProductNotFound(id))?;
        self.assets.remove(&existing.asset_ref).await;
        let product = self.db.delete_product(id).await?;
        info!("📦️ Product #{id} ({}) deleted", product.name);
        self.reload().await?;
        Ok(product)
    }
}
