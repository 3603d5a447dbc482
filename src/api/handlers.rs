//! API Handlers
//!
//! HTTP request handlers for the cache admin endpoints. Every admin endpoint
//! takes `?cacheName=<name>`, or `?cacheName=all` to act on every cache.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::cache::{CacheOptions, CacheRegistry, Fanout, StatsSnapshot};
use crate::config::CacheDefinitions;
use crate::error::{CacheError, Result};
use crate::models::{CacheNameQuery, HealthResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CacheRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<CacheRegistry>) -> Self {
        Self { registry }
    }

    /// Registers every defined cache on a registry bound to the current
    /// runtime. Cache values are arbitrary JSON.
    pub fn from_definitions(definitions: &CacheDefinitions) -> Result<Self> {
        let registry = CacheRegistry::with_current_runtime()?;
        for (name, overrides) in definitions {
            registry.register::<serde_json::Value>(name.as_str(), overrides)?;
        }
        Ok(Self::new(Arc::new(registry)))
    }
}

/// Runs a registry operation that may prune or clear large caches off the
/// async workers.
async fn run_blocking<F>(state: AppState, op: F) -> Result<()>
where
    F: FnOnce(&CacheRegistry) -> Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&state.registry))
        .await
        .map_err(|e| CacheError::Internal(e.to_string()))?
}

/// Handler for POST /purgeStale
pub async fn purge_stale_handler(
    State(state): State<AppState>,
    Query(query): Query<CacheNameQuery>,
) -> Result<StatusCode> {
    let name = query.into_name()?;
    info!(cache = %name, "purge stale requested");

    run_blocking(state, move |registry| registry.purge_stale(&name)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST /clearCache
pub async fn clear_cache_handler(
    State(state): State<AppState>,
    Query(query): Query<CacheNameQuery>,
) -> Result<StatusCode> {
    let name = query.into_name()?;
    info!(cache = %name, "clear cache requested");

    run_blocking(state, move |registry| registry.clear_cache(&name)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /getOptions
pub async fn get_options_handler(
    State(state): State<AppState>,
    Query(query): Query<CacheNameQuery>,
) -> Result<Json<Fanout<CacheOptions>>> {
    let name = query.into_name()?;
    Ok(Json(state.registry.get_options(&name)?))
}

/// Handler for GET /getStats
pub async fn get_stats_handler(
    State(state): State<AppState>,
    Query(query): Query<CacheNameQuery>,
) -> Result<Json<Fanout<StatsSnapshot>>> {
    let name = query.into_name()?;
    Ok(Json(state.registry.get_stats(&name)?))
}

/// Handler for POST /resetStats
pub async fn reset_stats_handler(
    State(state): State<AppState>,
    Query(query): Query<CacheNameQuery>,
) -> Result<StatusCode> {
    let name = query.into_name()?;
    info!(cache = %name, "reset stats requested");

    state.registry.reset_stats(&name)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.registry.len()))
}
