use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    error::{AppError, Result},
    models::User,
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub user_name: String,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i32> {
        self.sub
            .parse::<i32>()
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))
    }
}

pub fn generate_access_token(auth: &AuthConfig, user: &User) -> Result<String> {
    sign(
        user,
        &auth.access_secret,
        chrono::Duration::seconds(auth.access_ttl_secs),
    )
}

pub fn generate_refresh_token(auth: &AuthConfig, user: &User) -> Result<String> {
    sign(
        user,
        &auth.refresh_secret,
        chrono::Duration::days(auth.refresh_ttl_days),
    )
}

pub fn verify_access_token(auth: &AuthConfig, token: &str) -> Result<Claims> {
    verify(token, &auth.access_secret)
}

pub fn verify_refresh_token(auth: &AuthConfig, token: &str) -> Result<Claims> {
    verify(token, &auth.refresh_secret)
}

fn sign(user: &User, secret: &str, ttl: chrono::Duration) -> Result<String> {
    let now = chrono::Utc::now();
    let expiration = now
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::InternalError("Failed to calculate expiration".to_string()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        user_name: user.user_name.clone(),
        iat: now.timestamp() as usize,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalError(format!("Token generation failed: {}", e)))
}

fn verify(token: &str, secret: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("Token rejected: {}", e);
        AppError::Unauthorized("Expired Token - Access Restricted!".to_string())
    })
}
