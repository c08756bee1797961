//! TC3-HMAC-SHA256 request signing.
//!
//! Pure and deterministic: given identical inputs (including the injected
//! timestamp) the produced header set is byte-identical, which keeps the
//! algorithm testable without wall-clock dependence. Malformed inputs (an
//! empty secret, say) are a caller contract violation, not a runtime error
//! this module detects.

use chrono::DateTime;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "TC3-HMAC-SHA256";
const SIGNED_HEADERS: &str = "content-type;host;x-tc-action";
const CONTENT_TYPE: &str = "application/json; charset=utf-8";
const SCOPE_SUFFIX: &str = "tc3_request";

/// One request to be signed.
#[derive(Debug, Clone)]
pub struct Tc3Request<'a> {
    pub secret_id: &'a str,
    pub secret_key: &'a str,
    /// Service name, e.g. `ai3d`.
    pub service: &'a str,
    /// API host, e.g. `ai3d.tencentcloudapi.com`.
    pub host: &'a str,
    pub region: &'a str,
    /// API action, e.g. `SubmitHunyuanTo3DJob`.
    pub action: &'a str,
    /// API version date, e.g. `2025-05-13`.
    pub version: &'a str,
    /// Serialized JSON request body.
    pub payload: &'a str,
    /// Unix timestamp (seconds). Injected so signing stays deterministic.
    pub timestamp: i64,
}

/// The authenticated header set for one signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub authorization: String,
    pub host: String,
    pub action: String,
    pub version: String,
    pub timestamp: String,
    pub region: String,
    pub content_type: String,
}

impl SignedHeaders {
    /// Header name/value pairs in the order they are applied to a request.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Authorization", self.authorization.as_str()),
            ("Host", self.host.as_str()),
            ("X-TC-Action", self.action.as_str()),
            ("X-TC-Version", self.version.as_str()),
            ("X-TC-Timestamp", self.timestamp.as_str()),
            ("X-TC-Region", self.region.as_str()),
            ("Content-Type", self.content_type.as_str()),
        ]
    }
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    // HMAC-SHA256 accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac-sha256 key");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Produce the authenticated header set for `request`.
pub fn sign(request: &Tc3Request<'_>) -> SignedHeaders {
    let date = DateTime::from_timestamp(request.timestamp, 0)
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "1970-01-01".to_string());

    // 1. Content hash, then the canonical request. The header block is fixed
    //    and lowercase: content-type, host, x-tc-action, newline-joined with
    //    a trailing newline.
    let hashed_payload = sha256_hex(request.payload.as_bytes());
    let canonical_request = format!(
        "POST\n/\n\ncontent-type:{}\nhost:{}\nx-tc-action:{}\n\n{}\n{}",
        CONTENT_TYPE,
        request.host,
        request.action.to_lowercase(),
        SIGNED_HEADERS,
        hashed_payload,
    );

    // 2. String to sign over the credential scope `date/service/tc3_request`.
    let scope = format!("{date}/{}/{SCOPE_SUFFIX}", request.service);
    let string_to_sign = format!(
        "{ALGORITHM}\n{}\n{scope}\n{}",
        request.timestamp,
        sha256_hex(canonical_request.as_bytes()),
    );

    // 3. Key derivation chain seeded from the secret key, then the final
    //    signature under the derived key.
    let k_date = hmac_sha256(
        format!("TC3{}", request.secret_key).as_bytes(),
        date.as_bytes(),
    );
    let k_service = hmac_sha256(&k_date, request.service.as_bytes());
    let k_signing = hmac_sha256(&k_service, SCOPE_SUFFIX.as_bytes());
    let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes()));

    let authorization = format!(
        "{ALGORITHM} Credential={}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
        request.secret_id,
    );

    SignedHeaders {
        authorization,
        host: request.host.to_string(),
        action: request.action.to_string(),
        version: request.version.to_string(),
        timestamp: request.timestamp.to_string(),
        region: request.region.to_string(),
        content_type: CONTENT_TYPE.to_string(),
    }
}
