use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::db_types::{NotificationFlags, Stars, UserAccount, UserId};

/// Inserts a bare user row unless one exists. Returns `true` if a row was created.
pub async fn ensure_user(user: UserId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("INSERT INTO users (id) VALUES ($1) ON CONFLICT(id) DO NOTHING")
        .bind(user)
        .execute(conn)
        .await?;
    let created = result.rows_affected() == 1;
    if created {
        debug!("🧑️ Created user #{user}");
    }
    Ok(created)
}

pub async fn user_by_id(user: UserId, conn: &mut SqliteConnection) -> Result<Option<UserAccount>, sqlx::Error> {
    sqlx::query_as::<_, UserAccount>(
        r#"SELECT id, balance, notification_flags, created_at, updated_at FROM users WHERE id = $1"#,
    )
    .bind(user)
    .fetch_optional(conn)
    .await
}

pub async fn balance(user: UserId, conn: &mut SqliteConnection) -> Result<Stars, sqlx::Error> {
    let balance = sqlx::query_scalar::<_, i64>("SELECT balance FROM users WHERE id = $1")
        .bind(user)
        .fetch_optional(conn)
        .await?
        .unwrap_or_default();
    Ok(Stars::from(balance))
}

/// Adds `amount` to the user's balance, creating the row if necessary. Returns the new balance, or `None` if the
/// new balance would not fit in an `i64`, in which case nothing was changed.
pub async fn credit(user: UserId, amount: Stars, conn: &mut SqliteConnection) -> Result<Option<Stars>, sqlx::Error> {
    let balance = sqlx::query_scalar::<_, i64>(
        r#"INSERT INTO users (id, balance) VALUES ($1, $2)
        ON CONFLICT(id) DO UPDATE SET
            balance = balance + excluded.balance,
            updated_at = CURRENT_TIMESTAMP
        WHERE users.balance <= 9223372036854775807 - excluded.balance
        RETURNING balance"#,
    )
    .bind(user)
    .bind(amount)
    .fetch_optional(conn)
    .await?;
    match balance {
        Some(b) => trace!("🧑️ User #{user} credited with {amount}. Balance is now {b}"),
        None => debug!("🧑️ Crediting {amount} to user #{user} would overflow the balance"),
    }
    Ok(balance.map(Stars::from))
}

/// Subtracts `amount` from the balance only if the balance covers it. Returns the new balance, or `None` if the
/// balance was insufficient (or the user does not exist), in which case nothing was changed.
pub async fn try_debit(user: UserId, amount: Stars, conn: &mut SqliteConnection) -> Result<Option<Stars>, sqlx::Error> {
    let balance = sqlx::query_scalar::<_, i64>(
        r#"UPDATE users SET
            balance = balance - $1,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $2 AND balance >= $1
        RETURNING balance"#,
    )
    .bind(amount)
    .bind(user)
    .fetch_optional(conn)
    .await?;
    if let Some(b) = balance {
        trace!("🧑️ User #{user} debited by {amount}. Balance is now {b}");
    }
    Ok(balance.map(Stars::from))
}

pub async fn notification_flags(
    user: UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<NotificationFlags>, sqlx::Error> {
    let flags = sqlx::query_scalar::<_, i64>("SELECT notification_flags FROM users WHERE id = $1")
        .bind(user)
        .fetch_optional(conn)
        .await?;
    Ok(flags.map(NotificationFlags::from))
}

pub async fn set_notification_flags(
    user: UserId,
    flags: NotificationFlags,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO users (id, notification_flags) VALUES ($1, $2)
        ON CONFLICT(id) DO UPDATE SET
            notification_flags = excluded.notification_flags,
            updated_at = CURRENT_TIMESTAMP"#,
    )
    .bind(user)
    .bind(flags.value())
    .execute(conn)
    .await?;
    Ok(())
}
