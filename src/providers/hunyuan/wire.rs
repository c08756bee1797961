//! Hunyuan wire types.
//!
//! Tencent-style envelope: every body is `{"Response": {...}}`, with errors
//! reported inside the envelope as `Response.Error` even on HTTP 200.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "Response")]
    pub response: ResponseBody<T>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseBody<T> {
    #[serde(rename = "Error", default)]
    pub error: Option<ApiErrorBody>,
    #[serde(rename = "RequestId", default)]
    pub request_id: Option<String>,
    #[serde(flatten)]
    pub payload: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmittedJob {
    #[serde(rename = "JobId")]
    pub job_id: String,
}

#[derive(Debug, Deserialize)]
pub struct JobState {
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "ErrorCode", default)]
    pub error_code: Option<String>,
    #[serde(rename = "ErrorMessage", default)]
    pub error_message: Option<String>,
    #[serde(rename = "ResultFile3Ds", default)]
    pub result_files: Vec<ResultFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultFile {
    #[serde(rename = "Type", default)]
    pub file_type: Option<String>,
    #[serde(rename = "Url")]
    pub url: String,
    #[serde(rename = "PreviewImageUrl", default)]
    pub preview_image_url: Option<String>,
}

/// Synchronous format-conversion result: the creation call already returns
/// the final artifact.
#[derive(Debug, Deserialize)]
pub struct ConvertedFile {
    #[serde(rename = "ResultFile")]
    pub result_file: ResultFile,
}
