//! Client configuration loaded from environment variables.
//!
//! All settings have defaults pointing at a local development backend, so
//! the client runs with zero configuration against `wayfare-backend`'s
//! dev server.

use std::time::Duration;

use wayfare_shared::constants::DEFAULT_REQUEST_TIMEOUT_MS;

/// Backend connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the backend API, without a trailing slash.
    /// Env: `WAYFARE_API_URL`
    /// Default: `http://127.0.0.1:8000/api/v1`
    pub base_url: String,

    /// Timeout applied to every request.
    /// Env: `WAYFARE_API_TIMEOUT_MS`
    /// Default: `10000`
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api/v1".to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("WAYFARE_API_URL") {
            let trimmed = url.trim();
            if !trimmed.is_empty() {
                config.base_url = trimmed.trim_end_matches('/').to_string();
            }
        }

        if let Ok(val) = std::env::var("WAYFARE_API_TIMEOUT_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                config.request_timeout = Duration::from_millis(ms);
            } else {
                tracing::warn!(value = %val, "Invalid WAYFARE_API_TIMEOUT_MS, using default");
            }
        }

        config
    }

    /// Join an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
