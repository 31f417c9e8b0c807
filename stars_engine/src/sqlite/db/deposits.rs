use sqlx::SqliteConnection;

use crate::db_types::{Deposit, Stars, UserId};

pub async fn insert(user: UserId, amount: Stars, conn: &mut SqliteConnection) -> Result<Deposit, sqlx::Error> {
    sqlx::query_as::<_, Deposit>(
        "INSERT INTO deposits (user_id, amount) VALUES ($1, $2) RETURNING id, user_id, amount, created_at",
    )
    .bind(user)
    .bind(amount)
    .fetch_one(conn)
    .await
}

pub async fn history(user: UserId, limit: i64, conn: &mut SqliteConnection) -> Result<Vec<Deposit>, sqlx::Error> {
    sqlx::query_as::<_, Deposit>(
        r#"SELECT id, user_id, amount, created_at FROM deposits
        WHERE user_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2"#,
    )
    .bind(user)
    .bind(limit)
    .fetch_all(conn)
    .await
}
