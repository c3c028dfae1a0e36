//! API error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dms::DmsError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Stream not found: {0}")]
    StreamNotFound(String),

    #[error("Stream limit reached ({0} streams)")]
    TooManyStreams(usize),

    #[error("Stream {0} has not analyzed any frames")]
    NoFrames(String),

    #[error(transparent)]
    Analyzer(#[from] DmsError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::StreamNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManyStreams(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NoFrames(_) => StatusCode::CONFLICT,
            ApiError::Analyzer(DmsError::KeypointsMissing { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Analyzer(DmsError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::StreamNotFound(_) => "stream_not_found",
            ApiError::TooManyStreams(_) => "too_many_streams",
            ApiError::NoFrames(_) => "no_frames",
            ApiError::Analyzer(DmsError::KeypointsMissing { .. }) => "keypoints_missing",
            ApiError::Analyzer(DmsError::Config(_)) => "analyzer_config",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let body = json!({
            "code": self.code(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
