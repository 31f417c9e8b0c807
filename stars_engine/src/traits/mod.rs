//! #  Record store contracts.
//!
//! This module defines the interfaces that database *backends* must expose to support the shop engine.
//!
//! * [`LedgerManagement`] covers user rows, star balances, the purchase and deposit logs, and the aggregate stats row.
//! * [`CatalogManagement`] covers the product table, which is the authoritative source behind the catalog cache.
//! * [`StoreDatabase`] ties both together for backends that can serve the whole engine.
mod catalog_management;
mod ledger_management;
mod store_database;

pub use catalog_management::{CatalogError, CatalogManagement};
pub use ledger_management::{LedgerError, LedgerManagement};
pub use store_database::StoreDatabase;
