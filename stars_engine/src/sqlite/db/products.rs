use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{NewProduct, Product, ProductId, ProductUpdate};

pub async fn fetch_all(conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT id, name, price, description, asset_ref FROM products ORDER BY id")
        .fetch_all(conn)
        .await
}

pub async fn fetch_by_id(id: ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT id, name, price, description, asset_ref FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Inserts the product with id `max(id) + 1` (or 1 in an empty table). The id is derived inside the insert statement
/// so that two concurrent inserts cannot be handed the same id.
pub async fn insert(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let product = sqlx::query_as::<_, Product>(
        r#"INSERT INTO products (id, name, price, description, asset_ref)
        SELECT COALESCE(MAX(id), 0) + 1, $1, $2, $3, $4 FROM products
        RETURNING id, name, price, description, asset_ref"#,
    )
    .bind(product.name)
    .bind(product.price)
    .bind(product.description)
    .bind(product.asset_ref)
    .fetch_one(conn)
    .await?;
    debug!("📦️ Product #{} ({}) inserted", product.id, product.name);
    Ok(product)
}

/// Applies a single-field update. Each field has its own statement; field names never reach the SQL text.
pub async fn update(
    id: ProductId,
    update: ProductUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let query = match update {
        ProductUpdate::Name(name) => sqlx::query_as::<_, Product>(
            "UPDATE products SET name = $1 WHERE id = $2 RETURNING id, name, price, description, asset_ref",
        )
        .bind(name),
        ProductUpdate::Price(price) => sqlx::query_as::<_, Product>(
            "UPDATE products SET price = $1 WHERE id = $2 RETURNING id, name, price, description, asset_ref",
        )
        .bind(price),
        ProductUpdate::Description(description) => sqlx::query_as::<_, Product>(
            "UPDATE products SET description = $1 WHERE id = $2 RETURNING id, name, price, description, asset_ref",
        )
        .bind(description),
        ProductUpdate::Asset(asset_ref) => sqlx::query_as::<_, Product>(
            "UPDATE products SET asset_ref = $1 WHERE id = $2 RETURNING id, name, price, description, asset_ref",
        )
        .bind(asset_ref),
    };
    let product = query.bind(id).fetch_optional(conn).await?;
    if let Some(p) = &product {
        debug!("📦️ Product #{} updated", p.id);
    }
    Ok(product)
}

pub async fn delete(id: ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as::<_, Product>(
        "DELETE FROM products WHERE id = $1 RETURNING id, name, price, description, asset_ref",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    if let Some(p) = &product {
        debug!("📦️ Product #{} ({}) deleted", p.id, p.name);
    }
    Ok(product)
}
