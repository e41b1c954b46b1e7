use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{Category, CategoryQuery, PageOptions},
};

pub async fn create_category(pool: &PgPool, name: &str, code: &str) -> Result<Category> {
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name, code) VALUES ($1, $2) RETURNING *",
    )
    .bind(name)
    .bind(code)
    .fetch_one(pool)
    .await?;

    Ok(category)
}

/// Find category by ID
pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(category)
}

/// Find category by name
pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(category)
}

pub async fn exists(pool: &PgPool, id: i32) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(exists)
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, params: &CategoryQuery) {
    if let Some(name) = params.name.as_deref().filter(|v| !v.is_empty()) {
        query.push(" AND name = ");
        query.push_bind(name.to_string());
    }

    if let Some(code) = params.code.as_deref().filter(|v| !v.is_empty()) {
        query.push(" AND code = ");
        query.push_bind(code.to_string());
    }
}

pub async fn search_categories(
    pool: &PgPool,
    params: &CategoryQuery,
    options: PageOptions,
) -> Result<(Vec<Category>, i64)> {
    let mut count: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM categories WHERE 1=1");
    push_filters(&mut count, params);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM categories WHERE 1=1");
    push_filters(&mut query, params);
    query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    query.push_bind(options.limit);
    query.push(" OFFSET ");
    query.push_bind(options.offset());

    let categories = query.build_query_as::<Category>().fetch_all(pool).await?;

    Ok((categories, total))
}

/// Returns `None` when the row changed since `version` was read.
pub async fn update_category(
    pool: &PgPool,
    id: i32,
    version: i32,
    name: &str,
) -> Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        r#"
        UPDATE categories
        SET name = $1, version = version + 1, updated_at = NOW()
        WHERE id = $2 AND version = $3
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(id)
    .bind(version)
    .fetch_optional(pool)
    .await?;

    Ok(category)
}

pub async fn delete_category(pool: &PgPool, id: i32) -> Result<u64> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
