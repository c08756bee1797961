//! Tripo integration.
//!
//! Bearer-token authenticated JSON API: task creation is a `POST /task`,
//! status is a `GET /task/{id}`. Errors are numeric-coded; terminal statuses
//! include moderation (`banned`) and expiry (`expired`) cases that carry no
//! explicit error code.

mod adapter;
pub mod errors;
mod wire;

pub use adapter::TripoAdapter;

use secrecy::SecretString;

use crate::error::Error;

const DEFAULT_BASE_URL: &str = "https://api.tripo3d.ai/v2/openapi";

/// Tripo adapter configuration.
#[derive(Debug, Clone)]
pub struct TripoConfig {
    /// API key, sent as a static bearer token.
    pub api_key: SecretString,
    /// API base URL (override for testing).
    pub base_url: String,
}

impl TripoConfig {
    /// Configuration with the production base URL.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Read the API key from `TRIPO_API_KEY`.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("TRIPO_API_KEY")
            .map_err(|_| Error::InvalidInput("TRIPO_API_KEY is not set".to_string()))?;
        Ok(Self::new(api_key))
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}
