use sqlx::SqliteConnection;

use crate::db_types::ShopStats;

/// Overwrites the singleton stats row with totals read from the source tables. No running counter is trusted.
pub async fn recompute(conn: &mut SqliteConnection) -> Result<ShopStats, sqlx::Error> {
    sqlx::query_as::<_, ShopStats>(
        r#"INSERT INTO stats (id, total_purchases, total_deposited, total_users, last_updated)
        VALUES (
            1,
            (SELECT COUNT(*) FROM purchases),
            (SELECT COALESCE(SUM(amount), 0) FROM deposits),
            (SELECT COUNT(*) FROM users),
            CURRENT_TIMESTAMP
        )
        ON CONFLICT(id) DO UPDATE SET
            total_purchases = excluded.total_purchases,
            total_deposited = excluded.total_deposited,
            total_users = excluded.total_users,
            last_updated = excluded.last_updated
        RETURNING total_purchases, total_deposited, total_users, last_updated"#,
    )
    .fetch_one(conn)
    .await
}

pub async fn fetch(conn: &mut SqliteConnection) -> Result<Option<ShopStats>, sqlx::Error> {
    sqlx::query_as::<_, ShopStats>(
        "SELECT total_purchases, total_deposited, total_users, last_updated FROM stats WHERE id = 1",
    )
    .fetch_optional(conn)
    .await
}
