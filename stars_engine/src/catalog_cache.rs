//! An in-memory snapshot of the product table.
//!
//! The snapshot is an immutable `BTreeMap` behind an `Arc`. Readers clone the `Arc` and iterate at their leisure;
//! writers build a complete new map and swap it in. A reader therefore sees either the old catalog or the new one,
//! never a half-applied edit, and never waits for a reload to finish.
use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;

use crate::db_types::{Product, ProductId};

pub type CatalogSnapshot = Arc<BTreeMap<ProductId, Product>>;

#[derive(Debug, Default)]
pub struct CatalogCache {
    snapshot: RwLock<CatalogSnapshot>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> CatalogSnapshot {
        Arc::clone(&self.snapshot.read())
    }

    /// Replaces the whole snapshot with the given products.
    pub fn replace<I: IntoIterator<Item = Product>>(&self, products: I) {
        let map = products.into_iter().map(|p| (p.id, p)).collect::<BTreeMap<_, _>>();
        *self.snapshot.write() = Arc::new(map);
    }

    pub fn get(&self, id: ProductId) -> Option<Product> {
        self.snapshot.read().get(&id).cloned()
    }

    /// All products in id order.
    pub fn products(&self) -> Vec<Product> {
        self.snapshot().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.read().is_empty()
    }
}
