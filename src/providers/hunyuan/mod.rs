//! Hunyuan (Tencent Cloud style) integration.
//!
//! Every call is a signed `POST` using the TC3-HMAC-SHA256 scheme from
//! [`crate::auth::tc3`], including status queries. The query action that
//! answers a job depends on how the job was submitted, so the adapter keeps a
//! bounded task-id → query-route map. Format conversion is synchronous on
//! this vendor: the adapter fabricates a local task id so the polling engine
//! needs no special case.

mod adapter;
pub mod errors;
mod upload;
mod wire;

pub use adapter::HunyuanAdapter;
pub use upload::ObjectUploader;

use secrecy::SecretString;

use crate::error::Error;

const DEFAULT_ENDPOINT: &str = "https://ai3d.tencentcloudapi.com";
const DEFAULT_REGION: &str = "ap-guangzhou";
const DEFAULT_VERSION: &str = "2025-05-13";
const SERVICE: &str = "ai3d";

/// Hunyuan adapter configuration.
#[derive(Debug, Clone)]
pub struct HunyuanConfig {
    /// Credential id, embedded in the Authorization header.
    pub secret_id: String,
    /// Credential key, used only for signing-key derivation.
    pub secret_key: SecretString,
    pub region: String,
    /// API endpoint (override for testing).
    pub endpoint: String,
    /// API version date.
    pub version: String,
}

impl HunyuanConfig {
    /// Configuration with the production endpoint and default region.
    pub fn new(secret_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: SecretString::from(secret_key.into()),
            region: DEFAULT_REGION.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            version: DEFAULT_VERSION.to_string(),
        }
    }

    /// Read credentials from `TENCENT_SECRET_ID` / `TENCENT_SECRET_KEY`,
    /// with `TENCENT_REGION` optional.
    pub fn from_env() -> Result<Self, Error> {
        let secret_id = std::env::var("TENCENT_SECRET_ID")
            .map_err(|_| Error::InvalidInput("TENCENT_SECRET_ID is not set".to_string()))?;
        let secret_key = std::env::var("TENCENT_SECRET_KEY")
            .map_err(|_| Error::InvalidInput("TENCENT_SECRET_KEY is not set".to_string()))?;
        let mut config = Self::new(secret_id, secret_key);
        if let Ok(region) = std::env::var("TENCENT_REGION") {
            config.region = region;
        }
        Ok(config)
    }

    /// Override the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Override the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// The host portion of the endpoint, as signed into requests.
    pub fn host(&self) -> &str {
        self.endpoint
            .strip_prefix("https://")
            .or_else(|| self.endpoint.strip_prefix("http://"))
            .unwrap_or(&self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_strips_the_scheme() {
        let config = HunyuanConfig::new("id", "key");
        assert_eq!(config.host(), "ai3d.tencentcloudapi.com");

        let config = config.with_endpoint("http://127.0.0.1:18080/");
        assert_eq!(config.endpoint, "http://127.0.0.1:18080");
        assert_eq!(config.host(), "127.0.0.1:18080");
    }
}
