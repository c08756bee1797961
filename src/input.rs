//! Image input classification.
//!
//! Callers hand adapters a raw image reference that may be a remote URL, a
//! `data:` URI, or a bare base64 payload. Classification happens before any
//! network call so that unusable inputs fail fast as [`Error::InvalidInput`].

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Error;

/// Minimum length for defensive detection of an unprefixed base64 payload.
/// Anything shorter is far more likely to be a mistyped path or prompt.
const MIN_BARE_BASE64_LEN: usize = 100;

lazy_static! {
    static ref URL_RE: Regex =
        Regex::new(r"(?i)^https?://\S+$").expect("url regex must compile");
    static ref DATA_URI_RE: Regex =
        Regex::new(r"(?i)^data:image/[a-z0-9.+-]+;base64,").expect("data-uri regex must compile");
    static ref BASE64_RE: Regex =
        Regex::new(r"^[A-Za-z0-9+/]+={0,2}$").expect("base64 regex must compile");
}

/// How a raw image reference will be transmitted to a vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSourceKind {
    /// Remote HTTP/HTTPS URL, passed to the vendor by reference.
    Url,
    /// Base64-encoded bytes, inlined into the request (with or without a
    /// `data:image/...;base64,` header).
    Inline,
    /// Neither; the caller must convert it first.
    Unknown,
}

/// Classify a raw image reference.
///
/// Rules are applied in priority order: URL pattern, data-URI header, then a
/// defensive check for an unprefixed base64 payload of plausible length.
pub fn classify(raw: &str) -> ImageSourceKind {
    let raw = raw.trim();
    if URL_RE.is_match(raw) {
        return ImageSourceKind::Url;
    }
    if DATA_URI_RE.is_match(raw) {
        return ImageSourceKind::Inline;
    }
    if raw.len() >= MIN_BARE_BASE64_LEN && BASE64_RE.is_match(raw) {
        return ImageSourceKind::Inline;
    }
    ImageSourceKind::Unknown
}

/// Reject inputs that classify as [`ImageSourceKind::Unknown`].
pub fn validate(raw: &str) -> Result<ImageSourceKind, Error> {
    match classify(raw) {
        ImageSourceKind::Unknown => Err(Error::InvalidInput(
            "image input is neither an http(s) URL nor base64 data; \
             convert local files or unknown formats to a URL or a \
             data:image/...;base64 payload first"
                .to_string(),
        )),
        kind => Ok(kind),
    }
}

/// Strip a `data:image/...;base64,` header if present.
///
/// Idempotent: inputs without the header come back unchanged.
pub fn extract_payload(raw: &str) -> &str {
    let raw = raw.trim();
    if let Some(m) = DATA_URI_RE.find(raw) {
        &raw[m.end()..]
    } else {
        raw
    }
}
