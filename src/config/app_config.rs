use crate::error::{AppError, Result};
use std::{env, str::FromStr};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
    pub cache: CacheConfig,
    pub storage: S3Config,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_days: i64,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// When unset the listing cache lives in process memory.
    pub redis_url: Option<String>,
    pub key_prefix: String,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub bucket: String,
    pub upload_url_expiry_secs: u64,
}

pub const ACCESS_TOKEN_TTL_SECS: i64 = 2 * 60 * 60;
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 30;
pub const UPLOAD_URL_EXPIRY_SECS: u64 = 120;

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("PORT", "3000")?,
                max_body_size: parse_var("MAX_BODY_SIZE", "10485760")?,
            },
            database: DatabaseConfig {
                url: env::var("DB_URL")?,
                max_connections: parse_var("DB_MAX_CONNECTIONS", "20")?,
            },
            cors: CorsConfig {
                allowed_origins: split_origins(
                    &env::var("FRONTEND_URL")
                        .unwrap_or_else(|_| "http://localhost:3000".to_string()),
                ),
            },
            auth: AuthConfig {
                access_secret: env::var("JWT_SECRET")
                    .map_err(|_| AppError::ConfigError("JWT_SECRET not set".to_string()))?,
                refresh_secret: env::var("JWT_REFRESH_SECRET").map_err(|_| {
                    AppError::ConfigError("JWT_REFRESH_SECRET not set".to_string())
                })?,
                access_ttl_secs: ACCESS_TOKEN_TTL_SECS,
                refresh_ttl_days: REFRESH_TOKEN_TTL_DAYS,
            },
            cache: CacheConfig {
                redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
                key_prefix: env::var("REDIS_KEY_PREFIX")
                    .ok()
                    .filter(|prefix| !prefix.is_empty())
                    .unwrap_or_else(|| "storefront_cache:".to_string()),
                ttl_secs: parse_var("CACHE_TTL_SECS", "3600")?,
            },
            storage: S3Config {
                access_key_id: env::var("AWS_ACCESS_KEY_ID")
                    .map_err(|_| AppError::ConfigError("AWS_ACCESS_KEY_ID not set".to_string()))?,
                secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").map_err(|_| {
                    AppError::ConfigError("AWS_SECRET_ACCESS_KEY not set".to_string())
                })?,
                region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                bucket: env::var("S3_BUCKET")
                    .map_err(|_| AppError::ConfigError("S3_BUCKET not set".to_string()))?,
                upload_url_expiry_secs: UPLOAD_URL_EXPIRY_SECS,
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: FromStr>(key: &str, default: &str) -> Result<T> {
    parse_value(key, &env::var(key).unwrap_or_else(|_| default.to_string()))
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::ConfigError(format!("Invalid {} value", key)))
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_and_reports_the_offending_key() {
        let port: u16 = parse_value("PORT", " 8080 ").unwrap();
        assert_eq!(port, 8080);

        let err = parse_value::<u16>("PORT", "eighty").unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: Invalid PORT value");
    }

    #[test]
    fn splits_comma_separated_origins() {
        assert_eq!(
            split_origins("http://a.test, http://b.test,,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }
}
