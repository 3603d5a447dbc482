//! Request DTOs for the admin API
//!
//! Defines the query parameters accepted by the admin endpoints.

use serde::Deserialize;

use crate::error::{CacheError, Result};

/// Query string of every admin endpoint: `?cacheName=<name|all>`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheNameQuery {
    /// Target cache, or `all`
    #[serde(rename = "cacheName")]
    pub cache_name: Option<String>,
}

impl CacheNameQuery {
    /// The requested cache name; missing or empty names are rejected.
    pub fn into_name(self) -> Result<String> {
        match self.cache_name {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(CacheError::InvalidArgument(
                "cacheName query parameter is required".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_deserialize() {
        let query: CacheNameQuery = serde_json::from_str(r#"{"cacheName": "aCache"}"#).unwrap();
        assert_eq!(query.into_name().unwrap(), "aCache");
    }

    #[test]
    fn test_missing_name_is_invalid() {
        let query: CacheNameQuery = serde_json::from_str("{}").unwrap();
        assert!(matches!(query.into_name(), Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_empty_name_is_invalid() {
        let query = CacheNameQuery {
            cache_name: Some(String::new()),
        };
        assert!(query.into_name().is_err());
    }
}
