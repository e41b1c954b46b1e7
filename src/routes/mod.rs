pub mod categories;
pub mod health;
pub mod login;
pub mod products;
pub mod register;
pub mod users;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::{AppState, middleware::auth_middleware};

pub fn create_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/api", get(health::api_root))
        .route("/api/user/register", post(register::register_user))
        .route("/api/user/login", post(login::login_user))
        .route("/api/user/token/refresh", post(login::refresh_token));

    let protected = Router::new()
        .route("/api/user", get(users::list_users))
        .route("/api/user/me", get(users::current_user))
        .route("/api/user/logout", delete(login::logout_user))
        .route(
            "/api/user/{user_id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/api/category",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/category/{category_id}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .route(
            "/api/product",
            get(products::list_products).post(products::create_product),
        )
        .route("/api/product/upload/url", get(products::upload_url))
        .route(
            "/api/product/{product_id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public
        .merge(protected)
        .fallback(health::route_not_found)
}
