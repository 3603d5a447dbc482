//! Request and Response models for the admin API
//!
//! DTOs for query strings and response bodies. Options and stats are
//! serialized straight from the cache types.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::CacheNameQuery;
pub use responses::{ErrorResponse, HealthResponse};
