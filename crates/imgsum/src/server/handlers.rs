//! Route handlers.

use super::AppState;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use imgsum_core::{SummarizerInfo, SummaryResult};
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Multipart field carrying the uploaded files.
const IMAGES_FIELD: &str = "images";

/// An error rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[derive(Serialize)]
pub struct SummarizeResponse {
    #[serde(flatten)]
    result: SummaryResult,
    job_id: String,
}

/// `POST /summarize`
///
/// Uploads are staged in a per-request temp directory that is removed once
/// the response is built.
pub async fn summarize(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let job_id = uuid::Uuid::new_v4().to_string();
    let staging = tempfile::Builder::new()
        .prefix(&format!("imgsum-{job_id}-"))
        .tempdir()
        .map_err(|e| ApiError::internal(format!("Server error: {e}")))?;

    let mut saw_images = false;
    let mut names = HashSet::new();
    let mut paths = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        if field.name() != Some(IMAGES_FIELD) {
            continue;
        }
        saw_images = true;

        let Some(file_name) = field.file_name().map(secure_filename).filter(|n| !n.is_empty())
        else {
            continue;
        };
        let file_name = unique_name(&mut names, file_name);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?;

        let path = staging.path().join(&file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ApiError::internal(format!("Server error: {e}")))?;
        paths.push(path.to_string_lossy().into_owned());
    }

    if !saw_images {
        return Err(ApiError::bad_request("No images uploaded"));
    }
    if paths.is_empty() {
        return Err(ApiError::bad_request("No images provided"));
    }

    tracing::info!("Job {job_id}: processing {} uploaded images", paths.len());
    let result = state.summarizer.process_images(&paths).await;
    Ok(Json(SummarizeResponse { result, job_id }))
}

/// `GET /config`
pub async fn config(State(state): State<Arc<AppState>>) -> Json<SummarizerInfo> {
    Json(state.summarizer.get_info())
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "provider": state.summarizer.config().default_provider,
    }))
}

/// Keep the last path component and replace anything outside `[A-Za-z0-9._-]`.
fn secure_filename(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    base.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}

/// Prefix repeated names with a counter so uploads never overwrite each other.
fn unique_name(seen: &mut HashSet<String>, name: String) -> String {
    if seen.insert(name.clone()) {
        return name;
    }
    let mut i = 1;
    loop {
        let candidate = format!("{i}_{name}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        i += 1;
    }
}
