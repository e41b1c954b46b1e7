use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    error::Result,
    models::{User, UserToken},
};

/// Stores a fresh refresh token for the user, replacing any previous one,
/// and stamps the login time. Runs in one transaction.
pub async fn record_login(
    pool: &PgPool,
    user_id: i32,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<User> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM user_tokens WHERE user_id = $1 OR expires_at <= NOW()")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO user_tokens (user_id, token, expires_at) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET last_login_time = NOW(), updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(user)
}

pub async fn find_active(pool: &PgPool, token: &str) -> Result<Option<UserToken>> {
    let user_token = sqlx::query_as::<_, UserToken>(
        "SELECT * FROM user_tokens WHERE token = $1 AND expires_at > NOW()",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(user_token)
}

pub async fn delete_token(pool: &PgPool, token: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM user_tokens WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
