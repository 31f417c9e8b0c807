use sqlx::SqliteConnection;

use crate::db_types::{Product, Purchase, PurchaseRecord, UserId};

pub async fn insert(user: UserId, product: &Product, conn: &mut SqliteConnection) -> Result<Purchase, sqlx::Error> {
    sqlx::query_as::<_, Purchase>(
        r#"INSERT INTO purchases (user_id, product_id, price) VALUES ($1, $2, $3)
        RETURNING id, user_id, product_id, price, created_at"#,
    )
    .bind(user)
    .bind(product.id)
    .bind(product.price)
    .fetch_one(conn)
    .await
}

pub async fn count_for_user(user: UserId, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM purchases WHERE user_id = $1").bind(user).fetch_one(conn).await
}

/// The most recent purchases for the user, joined with the product table. Rows whose product has been deleted come
/// back with an empty product name.
pub async fn history(
    user: UserId,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PurchaseRecord>, sqlx::Error> {
    sqlx::query_as::<_, PurchaseRecord>(
        r#"SELECT
            purchases.id,
            purchases.product_id,
            products.name AS product_name,
            purchases.price,
            purchases.created_at
        FROM purchases LEFT JOIN products ON purchases.product_id = products.id
        WHERE purchases.user_id = $1
        ORDER BY purchases.created_at DESC, purchases.id DESC
        LIMIT $2"#,
    )
    .bind(user)
    .bind(limit)
    .fetch_all(conn)
    .await
}
