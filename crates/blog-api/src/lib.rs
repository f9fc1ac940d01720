//! Blog API - REST server
//!
//! Provides HTTP endpoints for users, posts and comments, with bearer-token
//! authentication on every write.

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Router wrapped so `/api/posts/` routes like `/api/posts`
pub type App = NormalizePath<Router>;

/// Create the application router over shared state
pub fn create_router(state: Arc<AppState>) -> Router {
    routes::app_routes(state.clone()).with_state(state)
}

/// Strip trailing slashes before routing.
///
/// Layers added with `Router::layer` run after a route has matched, so the
/// normalization has to wrap the finished router from the outside.
pub fn create_app(router: Router) -> App {
    NormalizePathLayer::trim_trailing_slash().layer(router)
}

/// Configuration for tests: fixed secret and cheap password hashing
#[cfg(any(test, feature = "test-utils"))]
pub fn test_config() -> blog_core::AppConfig {
    let mut config = blog_core::AppConfig::default();
    config.auth.jwt_secret = "test-secret-key-for-integration-tests".to_string();
    config.auth.password_memory_kib = 1024;
    config.auth.password_time_cost = 1;
    config.auth.password_parallelism = 1;
    config
}

/// Create an app over a fresh in-memory store for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub fn create_router_for_testing() -> App {
    create_app(create_router(Arc::new(AppState::in_memory(test_config()))))
}
