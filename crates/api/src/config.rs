//! Client configuration

use std::env;
use std::time::Duration;

/// Configuration for the backend API client, loaded from environment variables
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the Analogous backend
    pub base_url: String,
    /// Base URL of the web app, used for checkout return redirects
    pub app_base_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl ApiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env::var("ANALOGOUS_API_URL")
                .map_err(|_| ConfigError::Missing("ANALOGOUS_API_URL"))?,
            app_base_url: env::var("ANALOGOUS_APP_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            request_timeout: Duration::from_millis(
                env::var("ANALOGOUS_REQUEST_TIMEOUT_MS")
                    .unwrap_or_else(|_| "30000".to_string())
                    .parse()
                    .unwrap_or(30_000),
            ),
        })
    }

    /// Checkout success and cancel both return the user to the pricing page
    pub fn checkout_success_url(&self) -> String {
        format!("{}/pricing?checkout=success", self.app_base_url)
    }

    pub fn checkout_cancel_url(&self) -> String {
        format!("{}/pricing?checkout=cancelled", self.app_base_url)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
