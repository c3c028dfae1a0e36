//! Frame Routes

use axum::{
    extract::{Path, State},
    Json,
};
use dms::{EyeMetrics, LandmarkSet, Point2};
use serde::Deserialize;
use std::time::Instant;

use crate::error::ApiError;
use crate::stream::{FrameInput, FrameOutcome, StreamSession};
use crate::SharedState;

/// Precomputed per-eye aspect ratios
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EyesInput {
    pub left_ear: f64,
    pub right_ear: f64,
}

/// Request body for one frame
#[derive(Debug, Deserialize)]
pub struct FrameRequest {
    /// Capture time (ms)
    pub timestamp: u64,
    /// Face landmarks as `[x, y]` pairs; null when no single face was found
    #[serde(default)]
    pub landmarks: Option<Vec<[f64; 2]>>,
    /// Takes precedence over `landmarks` when present
    #[serde(default)]
    pub eyes: Option<EyesInput>,
}

impl FrameRequest {
    fn into_input(self) -> FrameInput {
        match (self.eyes, self.landmarks) {
            (Some(eyes), _) => FrameInput::Eyes(EyeMetrics::from_ears(eyes.left_ear, eyes.right_ear)),
            (None, landmarks) => FrameInput::Landmarks(
                landmarks.map(|points| points.into_iter().map(Point2::from).collect::<LandmarkSet>()),
            ),
        }
    }
}

/// Analyze one frame, creating the stream on first use
pub async fn post_frame(
    State(state): State<SharedState>,
    Path(stream_id): Path<String>,
    Json(request): Json<FrameRequest>,
) -> Result<Json<FrameOutcome>, ApiError> {
    let mut state = state.write().await;
    let max_streams = state.settings.server.max_streams;

    if !state.streams.contains_key(&stream_id) {
        if state.streams.len() >= max_streams {
            return Err(ApiError::TooManyStreams(max_streams));
        }
        let session = StreamSession::new(&stream_id, &state.settings)?;
        state.streams.insert(stream_id.clone(), session);
        metrics::gauge!("fatigue_active_streams").set(state.streams.len() as f64);
        tracing::info!(stream = %stream_id, "Stream opened");
    }

    let session = state
        .streams
        .get_mut(&stream_id)
        .ok_or_else(|| ApiError::StreamNotFound(stream_id.clone()))?;

    let timestamp = request.timestamp;
    let started = Instant::now();
    let outcome = session.process(request.into_input(), timestamp)?;
    metrics::histogram!("fatigue_analyze_seconds").record(started.elapsed().as_secs_f64());

    Ok(Json(outcome))
}
