//! Tripo wire types and vocabulary mappings.

use serde::Deserialize;

use crate::types::TaskKind;

/// Standard Tripo response envelope: `code` is `0` on success, a vendor error
/// code otherwise.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub suggestion: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedTask {
    pub task_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TaskData {
    pub task_id: String,
    #[serde(rename = "type")]
    pub task_type: String,
    pub status: String,
    #[serde(default)]
    pub progress: Option<u32>,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub create_time: Option<i64>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_msg: Option<String>,
}

/// Task output block. Several fields reference equivalent model files at
/// different fidelity; the adapter picks the primary by fixed priority
/// (`pbr_model` over `model` over `base_model`).
#[derive(Debug, Default, Deserialize)]
pub struct Output {
    #[serde(default)]
    pub pbr_model: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_model: Option<String>,
    #[serde(default)]
    pub rendered_image: Option<String>,
    #[serde(default)]
    pub rendered_video: Option<String>,
}

/// Vendor task type for a shared kind. `None` when Tripo has no such
/// operation (the capability gate keeps those from ever reaching the wire).
pub const fn task_type_for_kind(kind: TaskKind) -> Option<&'static str> {
    match kind {
        TaskKind::TextToModel => Some("text_to_model"),
        TaskKind::ImageToModel => Some("image_to_model"),
        TaskKind::Retexture => Some("texture_model"),
        TaskKind::Decimate => Some("decimate_model"),
        TaskKind::Rig => Some("animate_rig"),
        TaskKind::Animate => Some("animate_retarget"),
        TaskKind::Convert => None,
    }
}

/// Reverse mapping for status snapshots, which echo the vendor task type.
pub fn kind_for_task_type(task_type: &str) -> Option<TaskKind> {
    match task_type {
        "text_to_model" => Some(TaskKind::TextToModel),
        "image_to_model" => Some(TaskKind::ImageToModel),
        "texture_model" => Some(TaskKind::Retexture),
        "decimate_model" => Some(TaskKind::Decimate),
        "animate_rig" => Some(TaskKind::Rig),
        "animate_retarget" => Some(TaskKind::Animate),
        _ => None,
    }
}
