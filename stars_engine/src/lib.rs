//! Stars Shop Engine
//!
//! The engine holds the rules of a small digital-goods shop paid for in an in-app currency ("stars"): user balances,
//! the product catalog, purchases and deposits. It knows nothing about the chat transport the shop is operated through.
//!
//! The library is divided into:
//! 1. The record store contracts ([`traits`]) and their SQLite implementation ([`SqliteDatabase`]). The data types
//!    stored in the database are defined in [`db_types`].
//! 2. The public API ([`mod@shop_api`]): [`LedgerApi`], [`CatalogApi`] and [`PurchaseFlowApi`].
//! 3. Supporting state: the [`catalog_cache`] snapshot, the per-user [`flow_state`] of multi-step flows, and the
//!    [`assets`] directory holding product files.
//!
//! Completed purchases and deposits are published as [`events`], so that side effects such as admin notifications can
//! be hooked in without being able to disturb the ledger.
pub mod assets;
pub mod catalog_cache;
pub mod db_types;
pub mod events;
pub mod flow_state;
pub mod helpers;
pub mod shop_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use shop_api::{
    catalog_api::CatalogApi,
    errors::PurchaseFlowError,
    ledger_api::LedgerApi,
    purchase_flow_api::PurchaseFlowApi,
    shop_objects,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{CatalogError, CatalogManagement, LedgerError, LedgerManagement, StoreDatabase};
