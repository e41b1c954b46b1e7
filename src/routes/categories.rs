use axum::extract::State;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        ApiResponse, Category, CategoryQuery, CreateCategoryRequest, Page, PageOptions,
        UpdateCategoryRequest,
    },
    queries::category_queries,
    utils::{
        extractors::{AppJson, AppPath, AppQuery},
        validation::{Validator, non_blank},
    },
};

pub async fn list_categories(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<CategoryQuery>,
) -> Result<ApiResponse<Page<Category>>> {
    let options = PageOptions::new(params.page, params.limit);
    let (categories, total) =
        category_queries::search_categories(&state.db, &params, options).await?;

    Ok(ApiResponse::ok(
        "Categories record fetched successfully.",
        options.into_page(categories, total),
    ))
}

pub async fn create_category(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> Result<ApiResponse<Category>> {
    Validator::new()
        .check(
            non_blank(payload.name.as_deref()),
            "name",
            "Provide a valid category name",
        )
        .finish()?;

    let name = payload.name.as_deref().unwrap_or_default().trim();

    if category_queries::find_by_name(&state.db, name).await?.is_some() {
        return Err(AppError::BadRequest("Category already exists".to_string()));
    }

    let code = format!("CAT-{}", chrono::Utc::now().timestamp_millis());
    let category = category_queries::create_category(&state.db, name, &code).await?;

    Ok(ApiResponse::created("Category created successfully", category))
}

pub async fn get_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<Category>> {
    let category = category_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    Ok(ApiResponse::ok("Category fetched successfully", category))
}

pub async fn update_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateCategoryRequest>,
) -> Result<ApiResponse<Category>> {
    let name = payload.name.as_deref().map(str::trim);

    Validator::new()
        .check(
            name.is_none_or(|name| !name.is_empty()),
            "name",
            "Provide a valid category name",
        )
        .finish()?;

    let category = category_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    let Some(name) = name.filter(|name| *name != category.name) else {
        return Ok(ApiResponse::ok("Category updated successfully", category));
    };

    if category_queries::find_by_name(&state.db, name).await?.is_some() {
        return Err(AppError::BadRequest("Category already exists".to_string()));
    }

    let Some(category) =
        category_queries::update_category(&state.db, id, category.version, name).await?
    else {
        return Err(match category_queries::find_by_id(&state.db, id).await? {
            Some(_) => AppError::Conflict("Category was modified concurrently".to_string()),
            None => AppError::NotFound("Category not found".to_string()),
        });
    };

    // product listings embed the category name
    state.cache.invalidate_products().await;

    Ok(ApiResponse::ok("Category updated successfully", category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<()>> {
    if category_queries::delete_category(&state.db, id).await? == 0 {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    state.cache.invalidate_products().await;

    Ok(ApiResponse::message("Category deleted successfully"))
}
