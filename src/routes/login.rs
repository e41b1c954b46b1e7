use axum::extract::State;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{AccessTokenResponse, ApiResponse, LoginRequest, LoginResponse, RefreshTokenRequest},
    queries::{token_queries, user_queries},
    routes::register::normalize_email,
    utils::{
        extractors::AppJson,
        jwt, password,
        validation::{Validator, is_email, non_blank},
    },
};

const INVALID_CREDENTIALS: &str = "Invalid Login Credentials";
const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";

pub async fn login_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>> {
    let supplied_password = payload.password.as_deref().map(str::trim).unwrap_or_default();

    Validator::new()
        .check(
            payload.email.as_deref().is_some_and(is_email),
            "email",
            "Provide a valid email",
        )
        .check(
            (4..=20).contains(&supplied_password.chars().count()),
            "password",
            "Password must be between 4 and 20 characters",
        )
        .finish()?;

    let email = normalize_email(payload.email.as_deref().unwrap_or_default());

    let user = user_queries::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !password::verify_password(supplied_password, &user.password).await? {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let access_token = jwt::generate_access_token(&state.auth, &user)?;
    let refresh_token = jwt::generate_refresh_token(&state.auth, &user)?;

    let expires_at = chrono::Utc::now() + chrono::Duration::days(state.auth.refresh_ttl_days);
    let user = token_queries::record_login(&state.db, user.id, &refresh_token, expires_at).await?;

    tracing::info!(user_id = user.id, "User signed in");

    Ok(ApiResponse::ok(
        "User signed in successfully",
        LoginResponse {
            user,
            access_token,
            refresh_token,
        },
    ))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshTokenRequest>,
) -> Result<ApiResponse<AccessTokenResponse>> {
    let token = required_refresh_token(&payload)?;

    if token_queries::find_active(&state.db, token).await?.is_none() {
        return Err(AppError::BadRequest(INVALID_REFRESH_TOKEN.to_string()));
    }

    let claims = jwt::verify_refresh_token(&state.auth, token)
        .map_err(|_| AppError::BadRequest(INVALID_REFRESH_TOKEN.to_string()))?;

    let user_id = claims
        .user_id()
        .map_err(|_| AppError::BadRequest(INVALID_REFRESH_TOKEN.to_string()))?;

    let user = user_queries::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::BadRequest(INVALID_REFRESH_TOKEN.to_string()))?;

    let access_token = jwt::generate_access_token(&state.auth, &user)?;

    Ok(ApiResponse::ok(
        "Access token created successfully",
        AccessTokenResponse { access_token },
    ))
}

pub async fn logout_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshTokenRequest>,
) -> Result<ApiResponse<()>> {
    let token = required_refresh_token(&payload)?;

    let removed = token_queries::delete_token(&state.db, token).await?;
    tracing::debug!(removed, "Refresh token revoked");

    Ok(ApiResponse::message("Logout successfully"))
}

fn required_refresh_token(payload: &RefreshTokenRequest) -> Result<&str> {
    Validator::new()
        .check(
            non_blank(payload.refresh_token.as_deref()),
            "refreshToken",
            "Provide a valid refresh token",
        )
        .finish()?;

    Ok(payload.refresh_token.as_deref().unwrap_or_default().trim())
}
