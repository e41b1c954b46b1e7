use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{AppState, error::AppError, queries::user_queries, utils::jwt};

/// Verifies the bearer access token and attaches the signed-in `User`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid token format".to_string()))?;

    let claims = jwt::verify_access_token(&state.auth, token)?;

    let user = user_queries::find_by_id(&state.db, claims.user_id()?)
        .await?
        .ok_or_else(|| {
            AppError::Unauthorized("Invalid User Account - Access Restricted!".to_string())
        })?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
