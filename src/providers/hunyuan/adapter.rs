//! Hunyuan adapter implementation.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use lru::LruCache;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{HunyuanConfig, SERVICE, errors, upload::ObjectUploader, wire};
use crate::adapter::ProviderAdapter;
use crate::auth::tc3;
use crate::error::Error;
use crate::input::{self, ImageSourceKind};
use crate::params::{Options, TaskParams};
use crate::types::{
    Artifacts, ErrorCode, ModelFormat, Provider, Task, TaskCapabilities, TaskError, TaskKind,
    TaskStatus,
};

const SUBMIT_STANDARD: &str = "SubmitHunyuanTo3DJob";
const QUERY_STANDARD: &str = "QueryHunyuanTo3DJob";
const SUBMIT_PRO: &str = "SubmitHunyuanTo3DProJob";
const QUERY_PRO: &str = "QueryHunyuanTo3DProJob";
const CONVERT: &str = "ConvertHunyuanTo3DFormat";

/// Bound for the job-route map. Entries evict LRU-first, so a very old poll
/// falls back to the standard query action instead of growing the map
/// forever.
const ROUTE_CACHE_CAPACITY: usize = 256;

/// How to answer a later status query for a created job.
#[derive(Debug, Clone)]
enum JobRoute {
    /// Ask the vendor, using the query action matched to the submit action.
    Query {
        action: &'static str,
        kind: TaskKind,
    },
    /// Already finished locally (synchronous conversion, or an observed
    /// terminal snapshot). Served without a vendor call.
    Completed(Box<Task>),
}

/// Hunyuan vendor adapter.
pub struct HunyuanAdapter {
    config: HunyuanConfig,
    http_client: reqwest::Client,
    capabilities: TaskCapabilities,
    uploader: Option<Arc<dyn ObjectUploader>>,
    routes: Mutex<LruCache<String, JobRoute>>,
}

impl HunyuanAdapter {
    /// Build an adapter with a fresh HTTP client.
    pub fn new(config: HunyuanConfig) -> Result<Self, Error> {
        let http_client = reqwest::Client::builder().build()?;
        Ok(Self::with_http_client(config, http_client))
    }

    /// Build an adapter on an existing HTTP client.
    pub fn with_http_client(config: HunyuanConfig, http_client: reqwest::Client) -> Self {
        let capabilities = TaskCapabilities::new()
            .with_kind(TaskKind::TextToModel)
            .with_kind(TaskKind::ImageToModel)
            .with_kind(TaskKind::Convert);
        Self {
            config,
            http_client,
            capabilities,
            uploader: None,
            routes: Mutex::new(LruCache::new(
                NonZeroUsize::new(ROUTE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    /// Route inline image payloads through object storage instead of
    /// inlining them into the request body.
    pub fn with_uploader(mut self, uploader: Arc<dyn ObjectUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// Issue one signed call and unwrap the vendor envelope.
    async fn call<T: DeserializeOwned>(&self, action: &str, body: &Value) -> Result<T, Error> {
        let payload = serde_json::to_string(body)?;
        let signed = tc3::sign(&tc3::Tc3Request {
            secret_id: &self.config.secret_id,
            secret_key: self.config.secret_key.expose_secret(),
            service: SERVICE,
            host: self.config.host(),
            region: &self.config.region,
            action,
            version: &self.config.version,
            payload: &payload,
            timestamp: Utc::now().timestamp(),
        });

        let mut request = self
            .http_client
            .post(&self.config.endpoint)
            .body(payload.clone());
        for (name, value) in signed.pairs() {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let http_status = response.status().as_u16();
        let text = response.text().await?;
        let body: Option<Value> = serde_json::from_str(&text).ok();

        // Tencent-style APIs report application errors inside the envelope,
        // usually on HTTP 200; treat both paths uniformly.
        if let Some(body) = &body
            && let Ok(envelope) = serde_json::from_value::<wire::Envelope<T>>(body.clone())
        {
            if let Some(error) = envelope.response.error {
                return Err(Error::ApiError {
                    code: errors::normalize_code(&error.code).to_string(),
                    message: error
                        .message
                        .unwrap_or_else(|| "hunyuan rejected the request".to_string()),
                    http_status: Some(http_status),
                    details: Some(body.clone()),
                });
            }
            // A payload on a failed HTTP status is not trusted; fall through
            // to the HTTP-level rejection below.
            if (200..300).contains(&http_status)
                && let Some(payload) = envelope.response.payload
            {
                return Ok(payload);
            }
        }

        if !(200..300).contains(&http_status) {
            return Err(Error::ApiError {
                code: format!("HTTP_{http_status}"),
                message: format!("hunyuan request failed with HTTP {http_status}"),
                http_status: Some(http_status),
                details: body,
            });
        }
        Err(Error::Json(
            "hunyuan response did not match the expected envelope".to_string(),
        ))
    }

    /// Base payload: the passthrough options bag (minus adapter directives);
    /// explicit PascalCase fields are inserted afterwards so they win.
    /// Returns the body and whether the "pro" pipeline was requested.
    fn base_payload(options: &Options) -> (Map<String, Value>, bool) {
        let mut body = Map::new();
        let mut pro = false;
        for (key, value) in options {
            if key == "pro" {
                pro = value.as_bool().unwrap_or(false);
                continue;
            }
            body.insert(key.clone(), value.clone());
        }
        (body, pro)
    }

    /// Prepare an image reference for submission: URLs pass through, inline
    /// payloads either upload-then-reference (when an uploader is configured)
    /// or inline as base64.
    async fn prepare_image(&self, image: &str, body: &mut Map<String, Value>) -> Result<(), Error> {
        match input::validate(image)? {
            ImageSourceKind::Url => {
                body.insert("ImageUrl".to_string(), json!(image));
            }
            // validate() already rejected Unknown.
            _ => {
                let payload = input::extract_payload(image);
                if let Some(uploader) = &self.uploader {
                    let bytes = BASE64.decode(payload).map_err(|err| {
                        Error::InvalidInput(format!("image payload is not valid base64: {err}"))
                    })?;
                    let key = format!("meshforge/{}.png", Uuid::new_v4());
                    let url = uploader.upload(bytes, &key).await?;
                    debug!(object_key = %key, "uploaded inline image for referencing");
                    body.insert("ImageUrl".to_string(), json!(url));
                } else {
                    body.insert("ImageBase64".to_string(), json!(payload));
                }
            }
        }
        Ok(())
    }

    /// Synchronous conversion: the creation call already returns the final
    /// artifact, so fabricate a locally-unique task id and record an
    /// already-Succeeded snapshot for the first status query.
    async fn convert(
        &self,
        source: &str,
        format: ModelFormat,
        options: &Options,
    ) -> Result<String, Error> {
        let (mut body, _) = Self::base_payload(options);
        body.insert("Url".to_string(), json!(source));
        body.insert("TargetFormat".to_string(), json!(format.as_vendor_str()));

        let converted: wire::ConvertedFile = self.call(CONVERT, &Value::Object(body)).await?;
        let task_id = format!("hunyuan-convert-{}", Uuid::new_v4());
        let now = Utc::now();

        let mut variants = std::collections::BTreeMap::new();
        variants.insert(format.to_string(), converted.result_file.url.clone());
        let task = Task {
            id: task_id.clone(),
            provider: Provider::Hunyuan,
            kind: Some(TaskKind::Convert),
            status: TaskStatus::Succeeded,
            progress: 100,
            artifacts: Some(Artifacts {
                model: converted.result_file.url,
                variants,
                preview_image: converted.result_file.preview_image_url,
                preview_video: None,
            }),
            error: None,
            created_at: Some(now),
            finished_at: Some(now),
            raw_status: Some("DONE".to_string()),
        };
        self.record_route(&task_id, JobRoute::Completed(Box::new(task)));
        Ok(task_id)
    }

    /// Normalize one vendor job-state payload into the shared model.
    ///
    /// Hunyuan reports only coarse status, so progress is a three-bucket
    /// estimate: 0 while waiting, 50 while running, 100 when done.
    fn normalize_job(task_id: &str, state: wire::JobState, kind: Option<TaskKind>) -> Task {
        let raw_status = state.status.clone();
        let (status, progress) = match raw_status.as_str() {
            "WAIT" => (TaskStatus::Pending, 0),
            "RUN" => (TaskStatus::Processing, 50),
            "DONE" => (TaskStatus::Succeeded, 100),
            "FAIL" => (TaskStatus::Failed, 0),
            other => {
                // Compatibility fallback, same as the other adapters: assume
                // in flight rather than failing the poll.
                warn!(status = other, task_id, "unknown hunyuan status");
                (TaskStatus::Processing, 50)
            }
        };

        let artifacts = if status == TaskStatus::Succeeded {
            Some(Self::collect_artifacts(&state.result_files))
        } else {
            None
        };

        let error = if status == TaskStatus::Failed {
            let raw = json!({
                "status": raw_status,
                "error_code": state.error_code,
                "error_message": state.error_message,
            });
            let (code, default_message) = match &state.error_code {
                Some(code) => (
                    errors::normalize_code(code),
                    "the generation job failed",
                ),
                None => errors::code_for_terminal_status(&raw_status)
                    .unwrap_or((ErrorCode::GenerationFailed, "the generation job failed")),
            };
            Some(TaskError {
                code,
                message: state
                    .error_message
                    .clone()
                    .unwrap_or_else(|| default_message.to_string()),
                raw: Some(raw),
            })
        } else {
            None
        };

        Task {
            id: task_id.to_string(),
            provider: Provider::Hunyuan,
            kind,
            status,
            progress,
            artifacts,
            error,
            created_at: None,
            finished_at: status.is_terminal().then(Utc::now),
            raw_status: Some(raw_status),
        }
    }

    /// Primary artifact by fixed priority: the GLB file when present,
    /// otherwise the first listed file.
    fn collect_artifacts(files: &[wire::ResultFile]) -> Artifacts {
        let primary = files
            .iter()
            .find(|f| f.file_type.as_deref() == Some("GLB"))
            .or_else(|| files.first());

        let mut artifacts = Artifacts {
            model: primary.map(|f| f.url.clone()).unwrap_or_default(),
            ..Artifacts::default()
        };
        for file in files {
            let name = file
                .file_type
                .as_deref()
                .map(str::to_ascii_lowercase)
                .unwrap_or_else(|| "model".to_string());
            artifacts.variants.entry(name).or_insert_with(|| file.url.clone());
            if artifacts.preview_image.is_none() {
                artifacts.preview_image = file.preview_image_url.clone();
            }
        }
        artifacts
    }

    fn record_route(&self, task_id: &str, route: JobRoute) {
        let mut routes = self.routes.lock().expect("route cache mutex");
        routes.put(task_id.to_string(), route);
    }

    fn lookup_route(&self, task_id: &str) -> Option<JobRoute> {
        let mut routes = self.routes.lock().expect("route cache mutex");
        routes.get(task_id).cloned()
    }
}

#[async_trait]
impl ProviderAdapter for HunyuanAdapter {
    fn provider(&self) -> Provider {
        Provider::Hunyuan
    }

    fn capabilities(&self) -> &TaskCapabilities {
        &self.capabilities
    }

    async fn create_task(&self, params: TaskParams) -> Result<String, Error> {
        let kind = params.kind();
        if !self.supports(kind) {
            return Err(Error::UnsupportedOperation {
                provider: Provider::Hunyuan,
                kind,
            });
        }

        let (submit_action, query_action, body) = match &params {
            TaskParams::TextToModel {
                prompt,
                negative_prompt,
                options,
            } => {
                let (mut body, pro) = Self::base_payload(options);
                body.insert("Prompt".to_string(), json!(prompt));
                if let Some(negative) = negative_prompt {
                    body.insert("NegativePrompt".to_string(), json!(negative));
                }
                if pro {
                    (SUBMIT_PRO, QUERY_PRO, body)
                } else {
                    (SUBMIT_STANDARD, QUERY_STANDARD, body)
                }
            }
            TaskParams::ImageToModel {
                image,
                prompt,
                options,
            } => {
                let (mut body, pro) = Self::base_payload(options);
                self.prepare_image(image, &mut body).await?;
                if let Some(prompt) = prompt {
                    body.insert("Prompt".to_string(), json!(prompt));
                }
                if pro {
                    (SUBMIT_PRO, QUERY_PRO, body)
                } else {
                    (SUBMIT_STANDARD, QUERY_STANDARD, body)
                }
            }
            TaskParams::Convert {
                source,
                format,
                options,
            } => {
                return self.convert(source, *format, options).await;
            }
            // The capability gate rejects everything else before this match.
            _ => {
                return Err(Error::UnsupportedOperation {
                    provider: Provider::Hunyuan,
                    kind,
                });
            }
        };

        debug!(%kind, action = submit_action, "submitting hunyuan job");
        let submitted: wire::SubmittedJob = self
            .call(submit_action, &Value::Object(body))
            .await?;
        // Remember which query action answers this job; some submit pipelines
        // use a dedicated query action.
        self.record_route(
            &submitted.job_id,
            JobRoute::Query {
                action: query_action,
                kind,
            },
        );
        Ok(submitted.job_id)
    }

    async fn get_task_status(&self, task_id: &str) -> Result<Task, Error> {
        let (action, kind) = match self.lookup_route(task_id) {
            Some(JobRoute::Completed(task)) => return Ok(*task),
            Some(JobRoute::Query { action, kind }) => (action, Some(kind)),
            None => {
                // Unknown id (evicted, or created by another process): fall
                // back to the standard query action.
                debug!(task_id, "no recorded route, querying the standard action");
                (QUERY_STANDARD, None)
            }
        };

        let body = json!({ "JobId": task_id });
        let state: wire::JobState = self.call(action, &body).await?;
        let task = Self::normalize_job(task_id, state, kind);
        if task.status.is_terminal() {
            self.record_route(task_id, JobRoute::Completed(Box::new(task.clone())));
        }
        Ok(task)
    }
}
