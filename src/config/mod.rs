mod app_config;
mod s3_config;

pub use app_config::{
    AppConfig, AuthConfig, CacheConfig, CorsConfig, DatabaseConfig, S3Config, ServerConfig,
};
pub use s3_config::load_s3_client;
