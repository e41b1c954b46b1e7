use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{PageOptions, User, UserQuery},
};

pub async fn create_user(
    pool: &PgPool,
    user_name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (user_name, email, password) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(user_name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_email_or_user_name(
    pool: &PgPool,
    email: &str,
    user_name: &str,
) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE email = $1 OR user_name = $2 LIMIT 1",
    )
    .bind(email)
    .bind(user_name)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn user_name_taken(pool: &PgPool, user_name: &str, except_id: i32) -> Result<bool> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE user_name = $1 AND id <> $2)",
    )
    .bind(user_name)
    .bind(except_id)
    .fetch_one(pool)
    .await?;

    Ok(taken)
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, params: &UserQuery) {
    if let Some(user_name) = params.user_name.as_deref().filter(|v| !v.is_empty()) {
        query.push(" AND user_name = ");
        query.push_bind(user_name.to_string());
    }

    if let Some(email) = params.email.as_deref().filter(|v| !v.is_empty()) {
        query.push(" AND email = ");
        query.push_bind(email.to_string());
    }
}

pub async fn search_users(
    pool: &PgPool,
    params: &UserQuery,
    options: PageOptions,
) -> Result<(Vec<User>, i64)> {
    let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1=1");
    push_filters(&mut count, params);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM users WHERE 1=1");
    push_filters(&mut query, params);
    query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    query.push_bind(options.limit);
    query.push(" OFFSET ");
    query.push_bind(options.offset());

    let users = query.build_query_as::<User>().fetch_all(pool).await?;

    Ok((users, total))
}

/// Returns `None` when the row changed since `version` was read.
pub async fn update_user_name(
    pool: &PgPool,
    id: i32,
    version: i32,
    user_name: &str,
) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET user_name = $1, version = version + 1, updated_at = NOW()
        WHERE id = $2 AND version = $3
        RETURNING *
        "#,
    )
    .bind(user_name)
    .bind(id)
    .bind(version)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn delete_user(pool: &PgPool, id: i32) -> Result<u64> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
