//! # Shop engine public API
//!
//! The APIs in this module are what the transport glue talks to. Each is generic over the record store traits it needs,
//! so any backend implementing [`crate::traits`] can drive the shop.
//!
//! * [`ledger_api`] covers balances, admin grants and revocations, notification flags, histories and statistics.
//! * [`catalog_api`] owns the catalog cache and the asset store, and performs every product mutation.
//! * [`purchase_flow_api`] runs the purchase and deposit flows and publishes the resulting events.
//!
//! ```rust,ignore
//! use stars_engine::{LedgerApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/stars_shop.db", 5).await?;
//! let api = LedgerApi::new(db);
//! let profile = api.profile(user).await?;
//! ```
pub mod catalog_api;
pub mod errors;
pub mod ledger_api;
pub mod purchase_flow_api;
pub mod shop_objects;

/// How many entries the purchase and deposit history screens show.
pub const DEFAULT_HISTORY_LIMIT: i64 = 10;
