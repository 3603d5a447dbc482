//! Configuration Module
//!
//! Server settings from environment variables, and the cache definitions the
//! server registers at startup.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;

use crate::cache::CacheOptionsOverrides;

/// Name of the cache registered when no definitions file is configured.
pub const DEFAULT_CACHE_NAME: &str = "default";

/// Cache name to option overrides, as read from the definitions file.
pub type CacheDefinitions = BTreeMap<String, CacheOptionsOverrides>;

/// Server configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// JSON file of cache definitions; a single default cache when unset
    pub caches_file: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHES_FILE` - Path of a JSON object mapping cache names to
    ///   options (default: unset)
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            caches_file: env::var_os("CACHES_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    // == Cache Definitions ==
    /// Reads the caches to register.
    pub fn cache_definitions(&self) -> anyhow::Result<CacheDefinitions> {
        let Some(path) = &self.caches_file else {
            return Ok(CacheDefinitions::from([(
                DEFAULT_CACHE_NAME.to_string(),
                CacheOptionsOverrides::default(),
            )]));
        };

        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read cache definitions from {}", path.display()))?;
        parse_cache_definitions(&json)
            .with_context(|| format!("invalid cache definitions in {}", path.display()))
    }
}

/// Parses `{ "<name>": <options>, ... }`.
pub fn parse_cache_definitions(json: &str) -> serde_json::Result<CacheDefinitions> {
    serde_json::from_str(json)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            caches_file: None,
        }
    }
}
