//! API Module
//!
//! HTTP handlers and routing for the cache admin API.
//!
//! # Endpoints
//! - `POST /purgeStale` - Prune stale entries
//! - `POST /clearCache` - Clear caches
//! - `GET /getOptions` - Cache configuration
//! - `GET /getStats` - Cache statistics
//! - `POST /resetStats` - Reset hit/miss counters
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
