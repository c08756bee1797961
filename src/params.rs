//! Task creation parameters.
//!
//! [`TaskParams`] is a discriminated union keyed by [`TaskKind`]: each variant
//! carries exactly the fields its operation needs, plus a generic `options`
//! bag passed through to the vendor payload. Precedence when an adapter builds
//! a vendor request body is fixed: generic defaults first, then the options
//! bag, then the variant's named fields — later-applied values win.
//!
//! Params are constructed by the caller and consumed once by a single
//! `create_task` call; the core never retains them.

use serde::{Deserialize, Serialize};

use crate::types::{ModelFormat, TaskKind};

/// Vendor passthrough options bag.
pub type Options = serde_json::Map<String, serde_json::Value>;

/// Parameters for one task creation, keyed by operation kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskParams {
    /// Generate a model from a text prompt.
    TextToModel {
        prompt: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        negative_prompt: Option<String>,
        #[serde(default, skip_serializing_if = "Options::is_empty")]
        options: Options,
    },
    /// Generate a model from a reference image (URL, data URI or base64).
    ImageToModel {
        image: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        prompt: Option<String>,
        #[serde(default, skip_serializing_if = "Options::is_empty")]
        options: Options,
    },
    /// Re-texture a previously generated model.
    Retexture {
        source_task_id: String,
        prompt: String,
        #[serde(default, skip_serializing_if = "Options::is_empty")]
        options: Options,
    },
    /// Reduce the polygon count of a previously generated model.
    Decimate {
        source_task_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_face_count: Option<u32>,
        #[serde(default, skip_serializing_if = "Options::is_empty")]
        options: Options,
    },
    /// Rig a previously generated model.
    Rig {
        source_task_id: String,
        #[serde(default, skip_serializing_if = "Options::is_empty")]
        options: Options,
    },
    /// Animate a rigged model with a named animation.
    Animate {
        source_task_id: String,
        animation: String,
        #[serde(default, skip_serializing_if = "Options::is_empty")]
        options: Options,
    },
    /// Convert a model (task reference or file URL) to another format.
    Convert {
        source: String,
        format: ModelFormat,
        #[serde(default, skip_serializing_if = "Options::is_empty")]
        options: Options,
    },
}

impl TaskParams {
    /// The operation kind this parameter set describes.
    pub const fn kind(&self) -> TaskKind {
        match self {
            Self::TextToModel { .. } => TaskKind::TextToModel,
            Self::ImageToModel { .. } => TaskKind::ImageToModel,
            Self::Retexture { .. } => TaskKind::Retexture,
            Self::Decimate { .. } => TaskKind::Decimate,
            Self::Rig { .. } => TaskKind::Rig,
            Self::Animate { .. } => TaskKind::Animate,
            Self::Convert { .. } => TaskKind::Convert,
        }
    }

    /// The vendor passthrough bag.
    pub const fn options(&self) -> &Options {
        match self {
            Self::TextToModel { options, .. }
            | Self::ImageToModel { options, .. }
            | Self::Retexture { options, .. }
            | Self::Decimate { options, .. }
            | Self::Rig { options, .. }
            | Self::Animate { options, .. }
            | Self::Convert { options, .. } => options,
        }
    }

    fn options_mut(&mut self) -> &mut Options {
        match self {
            Self::TextToModel { options, .. }
            | Self::ImageToModel { options, .. }
            | Self::Retexture { options, .. }
            | Self::Decimate { options, .. }
            | Self::Rig { options, .. }
            | Self::Animate { options, .. }
            | Self::Convert { options, .. } => options,
        }
    }

    /// Add a vendor passthrough option (builder style).
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options_mut().insert(key.into(), value);
        self
    }

    /// Text-to-model with no extras.
    pub fn text_to_model(prompt: impl Into<String>) -> Self {
        Self::TextToModel {
            prompt: prompt.into(),
            negative_prompt: None,
            options: Options::new(),
        }
    }

    /// Image-to-model from a URL, data URI or base64 payload.
    pub fn image_to_model(image: impl Into<String>) -> Self {
        Self::ImageToModel {
            image: image.into(),
            prompt: None,
            options: Options::new(),
        }
    }

    /// Re-texture `source_task_id` with a new prompt.
    pub fn retexture(source_task_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::Retexture {
            source_task_id: source_task_id.into(),
            prompt: prompt.into(),
            options: Options::new(),
        }
    }

    /// Decimate `source_task_id`, leaving the target face count to the vendor.
    pub fn decimate(source_task_id: impl Into<String>) -> Self {
        Self::Decimate {
            source_task_id: source_task_id.into(),
            target_face_count: None,
            options: Options::new(),
        }
    }

    /// Rig `source_task_id`.
    pub fn rig(source_task_id: impl Into<String>) -> Self {
        Self::Rig {
            source_task_id: source_task_id.into(),
            options: Options::new(),
        }
    }

    /// Animate `source_task_id` with the vendor animation `animation`.
    pub fn animate(source_task_id: impl Into<String>, animation: impl Into<String>) -> Self {
        Self::Animate {
            source_task_id: source_task_id.into(),
            animation: animation.into(),
            options: Options::new(),
        }
    }

    /// Convert `source` (task id or model URL) to `format`.
    pub fn convert(source: impl Into<String>, format: ModelFormat) -> Self {
        Self::Convert {
            source: source.into(),
            format,
            options: Options::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            TaskParams::text_to_model("x").kind(),
            TaskKind::TextToModel
        );
        assert_eq!(
            TaskParams::convert("task-1", ModelFormat::Obj).kind(),
            TaskKind::Convert
        );
        assert_eq!(TaskParams::rig("task-1").kind(), TaskKind::Rig);
    }

    #[test]
    fn options_accumulate() {
        let params = TaskParams::text_to_model("a chair")
            .with_option("face_limit", json!(5000))
            .with_option("style", json!("lowpoly"));
        assert_eq!(params.options().len(), 2);
        assert_eq!(params.options()["face_limit"], json!(5000));
    }

    #[test]
    fn serializes_with_kind_tag() {
        let params = TaskParams::animate("task-1", "walk");
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["kind"], "animate");
        assert_eq!(value["source_task_id"], "task-1");
        assert_eq!(value["animation"], "walk");
    }
}
