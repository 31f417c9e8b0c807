use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use stars_engine::{SqliteDatabase, StoreDatabase};

/// A migrated database in a fresh file of its own.
pub async fn new_test_db() -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let url = format!("sqlite://{}/stars_engine_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>());
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    db.migrate().await.expect("Error running migrations");
    debug!("🚀️ Test database ready at {url}");
    db
}

pub async fn tear_down(mut db: SqliteDatabase) {
    db.close().await;
    if let Err(e) = Sqlite::drop_database(db.url()).await {
        warn!("🚀️ Could not remove test database {}: {e}", db.url());
    }
}
