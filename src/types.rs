//! Shared task model types.
//!
//! Everything in this module is vendor-agnostic: the closed status / kind /
//! error-code vocabularies form the wire contract that every adapter maps its
//! vendor's bespoke API onto. Adding a vendor never extends these enums with
//! vendor-private cases; it adds a mapping in the vendor's module instead.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies which adapter produced a [`Task`] snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Tripo,
    Hunyuan,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tripo => write!(f, "tripo"),
            Self::Hunyuan => write!(f, "hunyuan"),
        }
    }
}

/// The semantic operation a task performs.
///
/// This is a closed enumeration shared across vendors even though each vendor
/// supports only a subset; use [`TaskCapabilities`] to test support before
/// submitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Generate a model from a text prompt.
    TextToModel,
    /// Generate a model from a reference image.
    ImageToModel,
    /// Re-texture an existing model from a text prompt.
    Retexture,
    /// Reduce the polygon count of an existing model.
    Decimate,
    /// Generate a skeleton rig for an existing model.
    Rig,
    /// Apply an animation to a rigged model.
    Animate,
    /// Convert a model to another file format.
    Convert,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::TextToModel => "text_to_model",
            Self::ImageToModel => "image_to_model",
            Self::Retexture => "retexture",
            Self::Decimate => "decimate",
            Self::Rig => "rig",
            Self::Animate => "animate",
            Self::Convert => "convert",
        };
        write!(f, "{s}")
    }
}

/// Normalized task lifecycle status.
///
/// Transitions only move forward: `Pending → Processing → terminal`, or
/// directly from either non-terminal state to a terminal one. A terminal
/// status is never revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl TaskStatus {
    /// Whether this status is terminal (Succeeded, Failed or Canceled).
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        };
        write!(f, "{s}")
    }
}

/// Shared error-code vocabulary.
///
/// Vendor-native error identifiers (numeric codes, dotted string codes,
/// status-string fallbacks) are normalized onto these cases. Unrecognized
/// vendor codes pass through as [`ErrorCode::Other`] so no information is
/// silently dropped when a vendor adds codes after this table was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ErrorCode {
    AuthenticationFailed,
    InsufficientCredits,
    RateLimited,
    InvalidParameter,
    ContentPolicyViolation,
    TaskNotFound,
    TaskExpired,
    TaskCanceled,
    GenerationFailed,
    ServerError,
    /// Vendor code with no documented mapping, passed through unmodified.
    Other(String),
}

impl ErrorCode {
    /// Stable string form used on the wire and in logs.
    pub fn as_str(&self) -> &str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::InsufficientCredits => "insufficient_credits",
            Self::RateLimited => "rate_limited",
            Self::InvalidParameter => "invalid_parameter",
            Self::ContentPolicyViolation => "content_policy_violation",
            Self::TaskNotFound => "task_not_found",
            Self::TaskExpired => "task_expired",
            Self::TaskCanceled => "task_canceled",
            Self::GenerationFailed => "generation_failed",
            Self::ServerError => "server_error",
            Self::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.as_str().to_string()
    }
}

impl From<String> for ErrorCode {
    fn from(s: String) -> Self {
        match s.as_str() {
            "authentication_failed" => Self::AuthenticationFailed,
            "insufficient_credits" => Self::InsufficientCredits,
            "rate_limited" => Self::RateLimited,
            "invalid_parameter" => Self::InvalidParameter,
            "content_policy_violation" => Self::ContentPolicyViolation,
            "task_not_found" => Self::TaskNotFound,
            "task_expired" => Self::TaskExpired,
            "task_canceled" => Self::TaskCanceled,
            "generation_failed" => Self::GenerationFailed,
            "server_error" => Self::ServerError,
            _ => Self::Other(s),
        }
    }
}

/// Error detail attached to a Failed or Canceled [`Task`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskError {
    /// Normalized error code.
    pub code: ErrorCode,
    /// Human-readable message (vendor message when available, otherwise a
    /// fixed default per failure case).
    pub message: String,
    /// Raw vendor payload for debugging; never consulted by the core.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

/// Named output references of a Succeeded task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifacts {
    /// The primary model reference, chosen by a fixed per-vendor priority
    /// when the vendor exposes several equivalent outputs.
    pub model: String,
    /// Additional named variants (e.g. per-format files, base meshes).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variants: BTreeMap<String, String>,
    /// Preview image, when the vendor renders one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_image: Option<String>,
    /// Turntable/preview video, when the vendor renders one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_video: Option<String>,
}

/// Canonical snapshot of one vendor-executed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Vendor-assigned identifier, opaque and unique within the vendor.
    pub id: String,
    /// Which adapter produced this snapshot.
    pub provider: Provider,
    /// The originating operation, when the vendor (or the adapter's route
    /// cache) can identify it. Some vendors do not echo it on status calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<TaskKind>,
    /// Normalized lifecycle status.
    pub status: TaskStatus,
    /// 0–100. Estimated when the vendor provides only coarse status.
    pub progress: u8,
    /// Present only when `status` is Succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Artifacts>,
    /// Present only when `status` is Failed or Canceled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,
    /// Vendor-reported creation time, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Set only on the terminal transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// The vendor's raw status string, kept as a debugging detail. Never
    /// overrides the normalized `status`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_status: Option<String>,
}

/// Target file format for [`TaskKind::Convert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    Glb,
    Obj,
    Fbx,
    Usdz,
    Stl,
}

impl ModelFormat {
    /// Uppercase form used by vendors that key formats that way.
    pub const fn as_vendor_str(self) -> &'static str {
        match self {
            Self::Glb => "GLB",
            Self::Obj => "OBJ",
            Self::Fbx => "FBX",
            Self::Usdz => "USDZ",
            Self::Stl => "STL",
        }
    }
}

impl std::fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_vendor_str().to_ascii_lowercase())
    }
}

/// The set of [`TaskKind`]s an adapter supports.
///
/// Populated once at adapter construction and read-only afterward.
#[derive(Debug, Clone, Default)]
pub struct TaskCapabilities {
    kinds: HashSet<TaskKind>,
}

impl TaskCapabilities {
    /// Create an empty capability set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a supported kind (builder style).
    pub fn with_kind(mut self, kind: TaskKind) -> Self {
        self.kinds.insert(kind);
        self
    }

    /// Membership test.
    pub fn supports(&self, kind: TaskKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Iterate the supported kinds (no particular order).
    pub fn iter(&self) -> impl Iterator<Item = TaskKind> + '_ {
        self.kinds.iter().copied()
    }
}
