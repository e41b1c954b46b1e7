use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{NewProduct, PageOptions, ProductChanges, ProductQuery, ProductRow},
};

const SELECT_PRODUCT: &str = r#"
    SELECT
        p.id, p.name, p.code, p.price, p.image, p.minimum_quantity, p.discount_rate,
        p.category_id, c.name AS category_name, c.code AS category_code,
        p.version, p.created_at, p.updated_at
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<ProductRow>> {
    let product = sqlx::query_as::<_, ProductRow>(&format!("{} WHERE p.id = $1", SELECT_PRODUCT))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(product)
}

pub async fn name_taken(pool: &PgPool, name: &str, except_id: Option<i32>) -> Result<bool> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM products WHERE name = $1 AND ($2::int IS NULL OR id <> $2))",
    )
    .bind(name)
    .bind(except_id)
    .fetch_one(pool)
    .await?;

    Ok(taken)
}

pub async fn create_product(pool: &PgPool, product: &NewProduct) -> Result<ProductRow> {
    let id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO products (
            name, code, price, image, minimum_quantity, discount_rate, category_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(&product.name)
    .bind(&product.code)
    .bind(product.price)
    .bind(&product.image)
    .bind(product.minimum_quantity)
    .bind(product.discount_rate)
    .bind(product.category_id)
    .fetch_one(pool)
    .await?;

    fetch_existing(pool, id).await
}

/// Returns `None` when the row changed since `version` was read.
pub async fn update_product(
    pool: &PgPool,
    id: i32,
    version: i32,
    changes: &ProductChanges,
) -> Result<Option<ProductRow>> {
    let updated: Option<i32> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET
            name = COALESCE($1, name),
            price = COALESCE($2, price),
            image = COALESCE($3, image),
            minimum_quantity = COALESCE($4, minimum_quantity),
            discount_rate = COALESCE($5, discount_rate),
            category_id = COALESCE($6, category_id),
            version = version + 1,
            updated_at = NOW()
        WHERE id = $7 AND version = $8
        RETURNING id
        "#,
    )
    .bind(&changes.name)
    .bind(changes.price)
    .bind(&changes.image)
    .bind(changes.minimum_quantity)
    .bind(changes.discount_rate)
    .bind(changes.category_id)
    .bind(id)
    .bind(version)
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(id) => Ok(Some(fetch_existing(pool, id).await?)),
        None => Ok(None),
    }
}

pub async fn delete_product(pool: &PgPool, id: i32) -> Result<u64> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, params: &ProductQuery) {
    if let Some(name) = params.name.as_deref().filter(|v| !v.is_empty()) {
        query.push(" AND p.name = ");
        query.push_bind(name.to_string());
    }

    if let Some(code) = params.code.as_deref().filter(|v| !v.is_empty()) {
        query.push(" AND p.code = ");
        query.push_bind(code.to_string());
    }

    if let Some(category) = params.category {
        query.push(" AND p.category_id = ");
        query.push_bind(category);
    }
}

pub async fn search_products(
    pool: &PgPool,
    params: &ProductQuery,
    options: PageOptions,
) -> Result<(Vec<ProductRow>, i64)> {
    let mut count: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM products p WHERE 1=1");
    push_filters(&mut count, params);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_PRODUCT);
    query.push(" WHERE 1=1");
    push_filters(&mut query, params);
    query.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ");
    query.push_bind(options.limit);
    query.push(" OFFSET ");
    query.push_bind(options.offset());

    let products = query.build_query_as::<ProductRow>().fetch_all(pool).await?;

    Ok((products, total))
}

async fn fetch_existing(pool: &PgPool, id: i32) -> Result<ProductRow> {
    let product = sqlx::query_as::<_, ProductRow>(&format!("{} WHERE p.id = $1", SELECT_PRODUCT))
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(product)
}
