//! Request handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::TranscriptRecord;

/// Body of `POST /fetch_transcripts`
#[derive(Debug, Deserialize)]
pub struct FetchRequest {
    #[serde(default)]
    pub channel_url: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn index() -> &'static str {
    "Hello from transcript API!"
}

/// Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Collect transcripts for every (capped) video of a channel.
pub async fn fetch_transcripts(
    State(state): State<AppState>,
    payload: Result<Json<FetchRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<TranscriptRecord>>> {
    let Json(request) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let channel_url = request
        .channel_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("channel_url is required"))?;

    let report = state.pipeline.run(&channel_url).await?;
    if report.was_aborted() {
        tracing::warn!(
            "Returning partial result for {} after repeated caption failures",
            channel_url
        );
    }

    Ok(Json(report.into_records()))
}
