//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are simple functions (rather than stateful structs) that accept a `&mut SqliteConnection`
//! argument. Callers can obtain a connection from a pool, or open an atomic transaction as the need arises and call
//! through to the functions without any other changes.
use std::{env, str::FromStr};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use super::SqliteDatabaseError;

pub mod deposits;
pub mod products;
pub mod purchases;
pub mod stats;
pub mod users;

const SQLITE_DB_URL: &str = "sqlite://data/stars_shop.db";

pub fn db_url() -> String {
    let result = env::var("STARS_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ STARS_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Opens a connection pool, creating the database file if it does not exist yet.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqliteDatabaseError> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|e| SqliteDatabaseError::InvalidUrl(format!("{url}: {e}")))?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
