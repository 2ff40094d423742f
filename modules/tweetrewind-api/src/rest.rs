use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::warn;

use tweetrewind_archive::{IndexFailure, PipelineError, Subject};

use crate::AppState;

const MSG_TIMEOUT: &str =
    "Request timeout - Wayback Machine is taking too long to respond. Please try again.";
const MSG_UNAVAILABLE: &str = "Wayback Machine is currently unavailable. Please try again later.";
const MSG_FAILED: &str = "Failed to fetch tweets";
const MSG_MISSING_USERNAME: &str = "Username is required";

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn pipeline_error_response(err: &PipelineError) -> Response {
    match err.index_reason() {
        Some(IndexFailure::Timeout) => error_response(StatusCode::REQUEST_TIMEOUT, MSG_TIMEOUT),
        Some(IndexFailure::Unreachable) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, MSG_UNAVAILABLE)
        }
        _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, MSG_FAILED),
    }
}

pub async fn api_tweets(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Response {
    let Some(subject) = Subject::parse(&username) else {
        return error_response(StatusCode::BAD_REQUEST, MSG_MISSING_USERNAME);
    };

    match state.archive.posts(subject.clone()).await {
        Ok(posts) => Json(posts).into_response(),
        Err(e) => {
            warn!(subject = %subject, error = %e, "Failed to fetch tweets");
            pipeline_error_response(&e)
        }
    }
}
