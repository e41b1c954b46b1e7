use axum::extract::State;
use rust_decimal::Decimal;

use crate::{
    AppState,
    error::{AppError, FieldError, Result},
    models::{
        ApiResponse, NewProduct, Page, PageOptions, ProductChanges, ProductQuery, ProductRequest,
        ProductResponse, UploadUrlQuery, UploadUrlResponse,
    },
    queries::{category_queries, product_queries},
    services::image_url_service,
    utils::{
        extractors::{AppJson, AppPath, AppQuery},
        validation::{Validator, is_http_url, is_safe_file_name, non_blank},
    },
};

const LISTING_MESSAGE: &str = "Product record fetched successfully.";

/// Prices are stored as NUMERIC(14, 4).
const MIN_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 4);
const MAX_PRICE: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

/// Unfiltered pages are served read-through from the listing cache.
/// A miss racing a write can store a page the write already invalidated; it lives until its TTL.
pub async fn list_products(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ProductQuery>,
) -> Result<ApiResponse<Page<ProductResponse>>> {
    let options = PageOptions::new(params.page, params.limit);

    if params.has_filters() {
        tracing::debug!("Fetching products from db, query present");
        let page = fetch_page(&state, &params, options).await?;
        return Ok(ApiResponse::ok(LISTING_MESSAGE, page));
    }

    let key = state.cache.products_page_key(options.page, options.limit);

    if let Some(cached) = state.cache.get(&key).await {
        match serde_json::from_str::<Page<ProductResponse>>(&cached) {
            Ok(page) => {
                tracing::debug!(key = %key, "Fetching products from cache");
                return Ok(ApiResponse::ok(LISTING_MESSAGE, page));
            }
            Err(e) => tracing::warn!(key = %key, error = %e, "Discarding unreadable cache entry"),
        }
    }

    tracing::debug!(key = %key, "Fetching products from db");
    let page = fetch_page(&state, &params, options).await?;

    match serde_json::to_string(&page) {
        Ok(serialized) => state.cache.set(&key, serialized).await,
        Err(e) => tracing::warn!(key = %key, error = %e, "Failed to serialize product page"),
    }

    Ok(ApiResponse::ok(LISTING_MESSAGE, page))
}

async fn fetch_page(
    state: &AppState,
    params: &ProductQuery,
    options: PageOptions,
) -> Result<Page<ProductResponse>> {
    let (rows, total) = product_queries::search_products(&state.db, params, options).await?;
    let items = rows.into_iter().map(ProductResponse::from).collect();

    Ok(options.into_page(items, total))
}

pub async fn create_product(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ProductRequest>,
) -> Result<ApiResponse<ProductResponse>> {
    let changes = validate_product(&payload, true)?;
    let category_id = changes.category_id.unwrap_or_default();

    ensure_category_exists(&state, category_id).await?;

    let name = changes.name.unwrap_or_default();

    if product_queries::name_taken(&state.db, &name, None).await? {
        return Err(AppError::BadRequest("Product already exists".to_string()));
    }

    let product = NewProduct {
        name,
        code: format!("PRO-{}", chrono::Utc::now().timestamp_millis()),
        price: changes.price.unwrap_or_default(),
        image: changes.image.unwrap_or_default(),
        minimum_quantity: changes.minimum_quantity.unwrap_or(1),
        discount_rate: changes.discount_rate.unwrap_or_default(),
        category_id,
    };

    let row = product_queries::create_product(&state.db, &product).await?;
    state.cache.invalidate_products().await;

    tracing::info!(product_id = row.id, "Product created");

    Ok(ApiResponse::created(
        "Product created successfully",
        ProductResponse::from(row),
    ))
}

pub async fn get_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<ProductResponse>> {
    let product = product_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(product_not_found)?;

    Ok(ApiResponse::ok(
        "Product fetched successfully",
        ProductResponse::from(product),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<ProductRequest>,
) -> Result<ApiResponse<ProductResponse>> {
    let changes = validate_product(&payload, false)?;

    let product = product_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(product_not_found)?;

    if let Some(category_id) = changes.category_id {
        ensure_category_exists(&state, category_id).await?;
    }

    if let Some(name) = changes.name.as_deref() {
        if name != product.name && product_queries::name_taken(&state.db, name, Some(id)).await? {
            return Err(AppError::BadRequest("Product already exists".to_string()));
        }
    }

    let Some(row) = product_queries::update_product(&state.db, id, product.version, &changes).await?
    else {
        return Err(match product_queries::find_by_id(&state.db, id).await? {
            Some(_) => AppError::Conflict("Product was modified concurrently".to_string()),
            None => product_not_found(),
        });
    };

    state.cache.invalidate_products().await;

    Ok(ApiResponse::ok(
        "Product updated successfully",
        ProductResponse::from(row),
    ))
}

pub async fn delete_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<()>> {
    if product_queries::delete_product(&state.db, id).await? == 0 {
        return Err(product_not_found());
    }

    state.cache.invalidate_products().await;

    tracing::info!(product_id = id, "Product deleted");

    Ok(ApiResponse::message("Product deleted successfully"))
}

pub async fn upload_url(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<UploadUrlQuery>,
) -> Result<ApiResponse<UploadUrlResponse>> {
    Validator::new()
        .check(
            params.file_name.as_deref().is_some_and(is_safe_file_name),
            "fileName",
            "Provide a valid file name",
        )
        .check(
            non_blank(params.file_type.as_deref()),
            "fileType",
            "Provide a valid file type",
        )
        .finish()?;

    let bucket = &state.storage.bucket;
    let key = image_url_service::product_object_key(params.file_name.as_deref().unwrap_or_default());
    let download_url = image_url_service::public_object_url(bucket, &key);

    if image_url_service::object_exists(&state.s3, bucket, &key).await? {
        return Ok(ApiResponse::ok(
            "File already exists in storage",
            UploadUrlResponse {
                pre_signed_url: None,
                download_url,
            },
        ));
    }

    let pre_signed_url = image_url_service::put_object_url(
        &state.s3,
        bucket,
        &key,
        params.file_type.as_deref().unwrap_or_default().trim(),
        state.storage.upload_url_expiry_secs,
    )
    .await?;

    Ok(ApiResponse::ok(
        "Url generated successfully.",
        UploadUrlResponse {
            pre_signed_url: Some(pre_signed_url),
            download_url,
        },
    ))
}

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}

async fn ensure_category_exists(state: &AppState, category_id: i32) -> Result<()> {
    if category_queries::exists(&state.db, category_id).await? {
        Ok(())
    } else {
        Err(AppError::Validation(vec![FieldError::new(
            "category",
            "Category not found",
        )]))
    }
}

fn is_storable_price(price: Decimal) -> bool {
    price >= MIN_PRICE && price < MAX_PRICE
}

/// Checks every supplied field; `require_all` additionally demands presence.
pub fn validate_product(payload: &ProductRequest, require_all: bool) -> Result<ProductChanges> {
    let present_or_optional = |present: bool| present || !require_all;
    let name = payload.name.as_deref().map(str::trim);
    let image = payload.image.as_deref().map(str::trim);

    Validator::new()
        .check(
            present_or_optional(name.is_some()) && name.is_none_or(|n| !n.is_empty()),
            "name",
            "Provide a valid product name",
        )
        .check(
            present_or_optional(payload.price.is_some())
                && payload.price.is_none_or(is_storable_price),
            "price",
            "Provide a valid price",
        )
        .check(
            present_or_optional(image.is_some()) && image.is_none_or(is_http_url),
            "image",
            "Provide a valid image url",
        )
        .check(
            present_or_optional(payload.minimum_quantity.is_some())
                && payload
                    .minimum_quantity
                    .is_none_or(|q| q > 0 && q <= i64::from(i32::MAX)),
            "minimumQuantity",
            "Provide a valid minimum quantity",
        )
        .check(
            present_or_optional(payload.discount_rate.is_some())
                && payload
                    .discount_rate
                    .is_none_or(|r| r >= Decimal::ZERO && r <= Decimal::ONE_HUNDRED),
            "discountRate",
            "Provide a valid discount rate",
        )
        .check(
            present_or_optional(payload.category.is_some()),
            "category",
            "Provide a valid category",
        )
        .finish()?;

    Ok(ProductChanges {
        name: name.map(str::to_string),
        price: payload.price,
        image: image.map(str::to_string),
        minimum_quantity: payload.minimum_quantity.map(|q| q as i32),
        discount_rate: payload.discount_rate,
        category_id: payload.category,
    })
}
