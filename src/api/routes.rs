//! API Routes
//!
//! Configures the Axum router with the cache admin endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_cache_handler, get_options_handler, get_stats_handler, health_handler,
    purge_stale_handler, reset_stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /purgeStale?cacheName=` - Prune stale entries
/// - `POST /clearCache?cacheName=` - Remove every entry
/// - `GET /getOptions?cacheName=` - Effective configuration
/// - `GET /getStats?cacheName=` - Hit/miss statistics
/// - `POST /resetStats?cacheName=` - Zero hits and misses
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/purgeStale", post(purge_stale_handler))
        .route("/clearCache", post(clear_cache_handler))
        .route("/getOptions", get(get_options_handler))
        .route("/getStats", get(get_stats_handler))
        .route("/resetStats", post(reset_stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
