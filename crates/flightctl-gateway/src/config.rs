//! Gateway configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the API server.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g. `0.0.0.0:3443`).
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// Path of the SQLite database file; `:memory:` for an ephemeral
    /// store.
    #[serde(default = "GatewayConfig::default_database_path")]
    pub database_path: String,

    /// Allowed CORS origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Request timeout in seconds; also bounds how long a cancelled client
    /// can keep server-side work alive.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:3443".to_string()
    }

    fn default_database_path() -> String {
        "flightctl.db".to_string()
    }

    const fn default_max_body() -> usize {
        1024 * 1024 // 1 MB
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    /// Defaults overridden by `LISTEN_ADDR` and `DB_PATH` environment
    /// variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(listen_addr) = std::env::var("LISTEN_ADDR") {
            config.listen_addr = listen_addr;
        }
        if let Ok(database_path) = std::env::var("DB_PATH") {
            config.database_path = database_path;
        }
        config
    }

    /// The request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            database_path: Self::default_database_path(),
            cors_origins: vec!["*".to_string()],
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:3443");
        assert_eq!(config.database_path, "flightctl.db");
        assert_eq!(config.max_body_bytes, 1024 * 1024);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }
}
