pub mod cache_service;
pub mod image_url_service;

pub use cache_service::{CacheBackend, create_cache_backend};
