use axum::{Extension, extract::State};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{ApiResponse, Page, PageOptions, UpdateUserRequest, User, UserQuery},
    queries::user_queries,
    utils::{
        extractors::{AppJson, AppPath, AppQuery},
        validation::Validator,
    },
};

pub async fn current_user(Extension(user): Extension<User>) -> ApiResponse<User> {
    ApiResponse::ok("Current User Fetched successfully", user)
}

pub async fn list_users(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<UserQuery>,
) -> Result<ApiResponse<Page<User>>> {
    let options = PageOptions::new(params.page, params.limit);
    let (users, total) = user_queries::search_users(&state.db, &params, options).await?;

    Ok(ApiResponse::ok(
        "Users record fetched successfully.",
        options.into_page(users, total),
    ))
}

pub async fn get_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<User>> {
    let user = user_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::ok("User fetched successfully", user))
}

pub async fn update_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<ApiResponse<User>> {
    let user_name = payload.user_name.as_deref().map(str::trim);

    Validator::new()
        .check(
            user_name.is_none_or(|name| !name.is_empty()),
            "userName",
            "Provide a valid userName",
        )
        .finish()?;

    let user = user_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let Some(user_name) = user_name.filter(|name| *name != user.user_name) else {
        return Ok(ApiResponse::ok("User updated successfully", user));
    };

    if user_queries::user_name_taken(&state.db, user_name, id).await? {
        return Err(AppError::BadRequest(
            "User with email/username already exists".to_string(),
        ));
    }

    let Some(user) = user_queries::update_user_name(&state.db, id, user.version, user_name).await?
    else {
        return Err(match user_queries::find_by_id(&state.db, id).await? {
            Some(_) => AppError::Conflict("User was modified concurrently".to_string()),
            None => AppError::NotFound("User not found".to_string()),
        });
    };

    Ok(ApiResponse::ok("User updated successfully", user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<()>> {
    if user_queries::delete_user(&state.db, id).await? == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = id, "User deleted");

    Ok(ApiResponse::message("User deleted successfully"))
}
