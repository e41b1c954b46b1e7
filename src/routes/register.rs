use axum::extract::State;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{ApiResponse, RegisterRequest, User},
    queries::user_queries,
    utils::{
        extractors::AppJson,
        password,
        validation::{Validator, is_email, non_blank},
    },
};

pub async fn register_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<ApiResponse<User>> {
    let (user_name, email, password) = validate_registration(&payload)?;

    if user_queries::find_by_email_or_user_name(&state.db, &email, &user_name)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(
            "User with email/username already exists".to_string(),
        ));
    }

    let password_hash = password::hash_password(&password).await?;

    let user = user_queries::create_user(&state.db, &user_name, &email, &password_hash).await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok(ApiResponse::created("User registered successfully", user))
}

pub fn validate_registration(payload: &RegisterRequest) -> Result<(String, String, String)> {
    let password = payload.password.as_deref().map(str::trim).unwrap_or_default();

    Validator::new()
        .check(
            non_blank(payload.user_name.as_deref()),
            "userName",
            "Provide a valid userName",
        )
        .check(
            payload.email.as_deref().is_some_and(is_email),
            "email",
            "Provide a valid email",
        )
        .check(
            (4..=20).contains(&password.chars().count()),
            "password",
            "Password must be between 4 and 20 characters",
        )
        .finish()?;

    Ok((
        payload.user_name.as_deref().unwrap_or_default().trim().to_string(),
        normalize_email(payload.email.as_deref().unwrap_or_default()),
        password.to_string(),
    ))
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
