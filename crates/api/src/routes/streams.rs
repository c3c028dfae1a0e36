//! Stream Routes

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use session::{DataQualitySnapshot, SessionSummary, WindowLog};

use crate::error::ApiError;
use crate::SharedState;

/// Response for the window endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowResponse {
    pub log: WindowLog,
    pub should_persist: bool,
}

/// Response for the reset endpoint
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub stream: String,
    pub reset: bool,
}

/// Clear analyzer, alert, quality and session state
pub async fn reset_stream(
    State(state): State<SharedState>,
    Path(stream_id): Path<String>,
) -> Result<Json<ResetResponse>, ApiError> {
    let mut state = state.write().await;
    let session = state
        .streams
        .get_mut(&stream_id)
        .ok_or_else(|| ApiError::StreamNotFound(stream_id.clone()))?;

    session.reset();
    tracing::info!(stream = %stream_id, "Stream reset");

    Ok(Json(ResetResponse {
        stream: stream_id,
        reset: true,
    }))
}

/// Get data quality counters
pub async fn get_quality(
    State(state): State<SharedState>,
    Path(stream_id): Path<String>,
) -> Result<Json<DataQualitySnapshot>, ApiError> {
    let state = state.read().await;
    let session = state
        .streams
        .get(&stream_id)
        .ok_or_else(|| ApiError::StreamNotFound(stream_id.clone()))?;

    Ok(Json(session.quality()))
}

/// Get the window log as of the last frame
pub async fn get_window(
    State(state): State<SharedState>,
    Path(stream_id): Path<String>,
) -> Result<Json<WindowResponse>, ApiError> {
    let state = state.read().await;
    let session = state
        .streams
        .get(&stream_id)
        .ok_or_else(|| ApiError::StreamNotFound(stream_id.clone()))?;

    let log = session
        .window_log()
        .ok_or_else(|| ApiError::NoFrames(stream_id.clone()))?;

    Ok(Json(WindowResponse {
        should_persist: log.should_persist(),
        log,
    }))
}

/// Finish the current session and return its summary
pub async fn post_summary(
    State(state): State<SharedState>,
    Path(stream_id): Path<String>,
) -> Result<Json<SessionSummary>, ApiError> {
    let mut state = state.write().await;
    let session = state
        .streams
        .get_mut(&stream_id)
        .ok_or_else(|| ApiError::StreamNotFound(stream_id.clone()))?;

    Ok(Json(session.finish()))
}
