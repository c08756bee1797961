//! Tripo adapter implementation.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lru::LruCache;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use super::{TripoConfig, errors, wire};
use crate::adapter::ProviderAdapter;
use crate::error::Error;
use crate::input::{self, ImageSourceKind};
use crate::params::{Options, TaskParams};
use crate::types::{
    Artifacts, Provider, Task, TaskCapabilities, TaskError, TaskKind, TaskStatus,
};

/// Bound for the terminal-snapshot cache; old entries evict LRU-first.
const TERMINAL_CACHE_CAPACITY: usize = 256;

/// Tripo vendor adapter.
pub struct TripoAdapter {
    config: TripoConfig,
    http_client: reqwest::Client,
    capabilities: TaskCapabilities,
    /// Once a task is observed terminal its snapshot is served from here,
    /// which enforces status monotonicity across fresh polls and skips
    /// pointless vendor calls.
    terminal: Mutex<LruCache<String, Task>>,
}

impl TripoAdapter {
    /// Build an adapter with a fresh HTTP client.
    pub fn new(config: TripoConfig) -> Result<Self, Error> {
        let http_client = reqwest::Client::builder().build()?;
        Ok(Self::with_http_client(config, http_client))
    }

    /// Build an adapter on an existing HTTP client.
    pub fn with_http_client(config: TripoConfig, http_client: reqwest::Client) -> Self {
        let capabilities = TaskCapabilities::new()
            .with_kind(TaskKind::TextToModel)
            .with_kind(TaskKind::ImageToModel)
            .with_kind(TaskKind::Retexture)
            .with_kind(TaskKind::Decimate)
            .with_kind(TaskKind::Rig)
            .with_kind(TaskKind::Animate);
        Self {
            config,
            http_client,
            capabilities,
            terminal: Mutex::new(LruCache::new(
                NonZeroUsize::new(TERMINAL_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    /// Base payload: the vendor task type, then the passthrough options bag.
    /// Explicit named fields are inserted afterwards so they win.
    fn base_payload(task_type: &str, options: &Options) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("type".to_string(), json!(task_type));
        for (key, value) in options {
            body.insert(key.clone(), value.clone());
        }
        body
    }

    /// Build the vendor creation payload for `params`.
    fn build_payload(params: &TaskParams) -> Result<Map<String, Value>, Error> {
        let kind = params.kind();
        let task_type = wire::task_type_for_kind(kind).ok_or(Error::UnsupportedOperation {
            provider: Provider::Tripo,
            kind,
        })?;

        let mut body = Self::base_payload(task_type, params.options());
        match params {
            TaskParams::TextToModel {
                prompt,
                negative_prompt,
                ..
            } => {
                body.insert("prompt".to_string(), json!(prompt));
                if let Some(negative) = negative_prompt {
                    body.insert("negative_prompt".to_string(), json!(negative));
                }
            }
            TaskParams::ImageToModel { image, prompt, .. } => {
                let file = match input::validate(image)? {
                    ImageSourceKind::Url => json!({ "type": "url", "url": image }),
                    // validate() already rejected Unknown.
                    _ => json!({ "type": "base64", "data": input::extract_payload(image) }),
                };
                body.insert("file".to_string(), file);
                if let Some(prompt) = prompt {
                    body.insert("prompt".to_string(), json!(prompt));
                }
            }
            TaskParams::Retexture {
                source_task_id,
                prompt,
                ..
            } => {
                body.insert("original_model_task_id".to_string(), json!(source_task_id));
                body.insert("prompt".to_string(), json!(prompt));
            }
            TaskParams::Decimate {
                source_task_id,
                target_face_count,
                ..
            } => {
                body.insert("original_model_task_id".to_string(), json!(source_task_id));
                if let Some(face_limit) = target_face_count {
                    body.insert("face_limit".to_string(), json!(face_limit));
                }
            }
            TaskParams::Rig { source_task_id, .. } => {
                body.insert("original_model_task_id".to_string(), json!(source_task_id));
            }
            TaskParams::Animate {
                source_task_id,
                animation,
                ..
            } => {
                body.insert("original_model_task_id".to_string(), json!(source_task_id));
                body.insert("animation".to_string(), json!(animation));
            }
            TaskParams::Convert { .. } => {
                // Unreachable: task_type_for_kind(Convert) is None.
                return Err(Error::UnsupportedOperation {
                    provider: Provider::Tripo,
                    kind,
                });
            }
        }
        Ok(body)
    }

    /// Send a request and unwrap the Tripo envelope, normalizing vendor
    /// rejections into [`Error::ApiError`].
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, Error> {
        let response = request
            .bearer_auth(self.config.api_key.expose_secret())
            .send()
            .await?;
        let http_status = response.status().as_u16();
        let text = response.text().await?;
        let body: Option<Value> = serde_json::from_str(&text).ok();

        if !(200..300).contains(&http_status) {
            let vendor_code = body
                .as_ref()
                .and_then(|b| b.get("code"))
                .and_then(Value::as_i64);
            let code = match vendor_code {
                Some(code) => errors::normalize_code(code),
                None => errors::code_for_http_status(http_status),
            };
            let message = body
                .as_ref()
                .and_then(|b| b.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("tripo request failed with HTTP {http_status}"));
            return Err(Error::ApiError {
                code: code.to_string(),
                message,
                http_status: Some(http_status),
                details: body,
            });
        }

        let body = body.ok_or_else(|| Error::Json("tripo returned a non-JSON body".to_string()))?;
        let envelope: wire::Envelope<T> = serde_json::from_value(body.clone())?;
        if envelope.code != 0 {
            let message = envelope
                .message
                .or(envelope.suggestion)
                .unwrap_or_else(|| "tripo rejected the request".to_string());
            return Err(Error::ApiError {
                code: errors::normalize_code(envelope.code).to_string(),
                message,
                http_status: Some(http_status),
                details: Some(body),
            });
        }
        envelope
            .data
            .ok_or_else(|| Error::Json("tripo response is missing the data block".to_string()))
    }

    /// Normalize one vendor status payload into the shared model.
    fn normalize_task(data: wire::TaskData) -> Task {
        let raw_status = data.status.clone();
        let status = match raw_status.as_str() {
            "queued" => TaskStatus::Pending,
            "running" => TaskStatus::Processing,
            "success" => TaskStatus::Succeeded,
            "failed" | "banned" | "expired" => TaskStatus::Failed,
            "cancelled" => TaskStatus::Canceled,
            other => {
                // Compatibility fallback: treat unknown vendor statuses as
                // still in flight rather than failing the poll.
                warn!(status = other, task_id = %data.task_id, "unknown tripo status");
                TaskStatus::Processing
            }
        };

        let progress = match status {
            TaskStatus::Succeeded => 100,
            TaskStatus::Pending => 0,
            _ => data.progress.unwrap_or(0).min(100) as u8,
        };

        let artifacts = if status == TaskStatus::Succeeded {
            Some(Self::collect_artifacts(&data.output))
        } else {
            None
        };

        let error = if status == TaskStatus::Failed || status == TaskStatus::Canceled {
            Some(Self::task_error(&data, &raw_status))
        } else {
            None
        };

        Task {
            id: data.task_id,
            provider: Provider::Tripo,
            kind: wire::kind_for_task_type(&data.task_type),
            status,
            progress,
            artifacts,
            error,
            created_at: data
                .create_time
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
            finished_at: status.is_terminal().then(Utc::now),
            raw_status: Some(raw_status),
        }
    }

    /// Primary model by fixed priority: material-enhanced (`pbr_model`) over
    /// plain-textured (`model`) over the texture-less base mesh.
    fn collect_artifacts(output: &wire::Output) -> Artifacts {
        let primary = output
            .pbr_model
            .as_deref()
            .or(output.model.as_deref())
            .or(output.base_model.as_deref())
            .unwrap_or_default()
            .to_string();

        let mut artifacts = Artifacts {
            model: primary,
            ..Artifacts::default()
        };
        for (name, value) in [
            ("pbr_model", &output.pbr_model),
            ("model", &output.model),
            ("base_model", &output.base_model),
        ] {
            if let Some(url) = value {
                artifacts.variants.insert(name.to_string(), url.clone());
            }
        }
        artifacts.preview_image = output.rendered_image.clone();
        artifacts.preview_video = output.rendered_video.clone();
        artifacts
    }

    fn task_error(data: &wire::TaskData, raw_status: &str) -> TaskError {
        let raw = json!({
            "status": raw_status,
            "error_code": data.error_code,
            "error_msg": data.error_msg,
        });
        if let Some(code) = data.error_code {
            return TaskError {
                code: errors::normalize_code(code),
                message: data
                    .error_msg
                    .clone()
                    .unwrap_or_else(|| "the vendor reported a generation failure".to_string()),
                raw: Some(raw),
            };
        }
        let (code, default_message) = errors::code_for_terminal_status(raw_status)
            .unwrap_or((crate::types::ErrorCode::GenerationFailed, "the task failed"));
        TaskError {
            code,
            message: data
                .error_msg
                .clone()
                .unwrap_or_else(|| default_message.to_string()),
            raw: Some(raw),
        }
    }

    fn cached_terminal(&self, task_id: &str) -> Option<Task> {
        let mut cache = self.terminal.lock().expect("terminal cache mutex");
        cache.get(task_id).cloned()
    }

    fn remember_terminal(&self, task: &Task) {
        if task.status.is_terminal() {
            let mut cache = self.terminal.lock().expect("terminal cache mutex");
            cache.put(task.id.clone(), task.clone());
        }
    }
}

#[async_trait]
impl ProviderAdapter for TripoAdapter {
    fn provider(&self) -> Provider {
        Provider::Tripo
    }

    fn capabilities(&self) -> &TaskCapabilities {
        &self.capabilities
    }

    async fn create_task(&self, params: TaskParams) -> Result<String, Error> {
        let kind = params.kind();
        if !self.supports(kind) {
            return Err(Error::UnsupportedOperation {
                provider: Provider::Tripo,
                kind,
            });
        }

        let body = Self::build_payload(&params)?;
        debug!(%kind, "submitting tripo task");
        let url = format!("{}/task", self.config.base_url);
        let created: wire::CreatedTask = self
            .execute(self.http_client.post(&url).json(&Value::Object(body)))
            .await?;
        Ok(created.task_id)
    }

    async fn get_task_status(&self, task_id: &str) -> Result<Task, Error> {
        if let Some(task) = self.cached_terminal(task_id) {
            return Ok(task);
        }

        let url = format!("{}/task/{task_id}", self.config.base_url);
        let data: wire::TaskData = self.execute(self.http_client.get(&url)).await?;
        let task = Self::normalize_task(data);
        self.remember_terminal(&task);
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorCode;

    fn task_data(status: &str) -> wire::TaskData {
        serde_json::from_value(json!({
            "task_id": "tr-1",
            "type": "text_to_model",
            "status": status,
            "progress": 42,
            "output": {},
            "create_time": 1_700_000_000,
        }))
        .unwrap()
    }

    #[test]
    fn normalizes_lifecycle_statuses() {
        assert_eq!(
            TripoAdapter::normalize_task(task_data("queued")).status,
            TaskStatus::Pending
        );
        assert_eq!(
            TripoAdapter::normalize_task(task_data("running")).status,
            TaskStatus::Processing
        );
        assert_eq!(
            TripoAdapter::normalize_task(task_data("success")).status,
            TaskStatus::Succeeded
        );
        assert_eq!(
            TripoAdapter::normalize_task(task_data("cancelled")).status,
            TaskStatus::Canceled
        );
    }

    #[test]
    fn unknown_status_falls_back_to_processing() {
        let task = TripoAdapter::normalize_task(task_data("warming_up"));
        assert_eq!(task.status, TaskStatus::Processing);
        assert_eq!(task.raw_status.as_deref(), Some("warming_up"));
        assert!(task.finished_at.is_none());
    }

    #[test]
    fn banned_maps_to_failed_with_policy_code() {
        let task = TripoAdapter::normalize_task(task_data("banned"));
        assert_eq!(task.status, TaskStatus::Failed);
        let error = task.error.unwrap();
        assert_eq!(error.code, ErrorCode::ContentPolicyViolation);
        assert!(!error.message.is_empty());
        assert!(task.finished_at.is_some());
        assert!(task.artifacts.is_none());
    }

    #[test]
    fn primary_artifact_priority() {
        let mut data = task_data("success");
        data.output = serde_json::from_value(json!({
            "pbr_model": "https://cdn/x-pbr.glb",
            "model": "https://cdn/x.glb",
            "base_model": "https://cdn/x-base.glb",
            "rendered_image": "https://cdn/x.webp",
        }))
        .unwrap();
        let task = TripoAdapter::normalize_task(data);
        let artifacts = task.artifacts.unwrap();
        assert_eq!(artifacts.model, "https://cdn/x-pbr.glb");
        assert_eq!(artifacts.variants.len(), 3);
        assert_eq!(artifacts.preview_image.as_deref(), Some("https://cdn/x.webp"));
        assert_eq!(task.progress, 100);

        let mut data = task_data("success");
        data.output = serde_json::from_value(json!({
            "model": "https://cdn/y.glb",
            "base_model": "https://cdn/y-base.glb",
        }))
        .unwrap();
        let task = TripoAdapter::normalize_task(data);
        assert_eq!(task.artifacts.unwrap().model, "https://cdn/y.glb");
    }

    #[test]
    fn payload_precedence_explicit_fields_win() {
        let params = TaskParams::text_to_model("a bronze statue")
            .with_option("prompt", json!("overridden"))
            .with_option("face_limit", json!(2000));
        let body = TripoAdapter::build_payload(&params).unwrap();
        assert_eq!(body["type"], "text_to_model");
        // Options bag applied first, explicit prompt wins.
        assert_eq!(body["prompt"], "a bronze statue");
        assert_eq!(body["face_limit"], 2000);
    }

    #[test]
    fn image_payload_classifies_input() {
        let params = TaskParams::image_to_model("https://x/y.png");
        let body = TripoAdapter::build_payload(&params).unwrap();
        assert_eq!(body["file"]["type"], "url");
        assert_eq!(body["file"]["url"], "https://x/y.png");

        let inline = format!("data:image/png;base64,{}", "QUJD".repeat(40));
        let params = TaskParams::image_to_model(inline);
        let body = TripoAdapter::build_payload(&params).unwrap();
        assert_eq!(body["file"]["type"], "base64");
        assert_eq!(body["file"]["data"], "QUJD".repeat(40));

        let params = TaskParams::image_to_model("not an image");
        assert!(matches!(
            TripoAdapter::build_payload(&params),
            Err(Error::InvalidInput(_))
        ));
    }
}
