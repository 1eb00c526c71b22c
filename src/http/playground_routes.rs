//! `/playground/jobs` routes (spec §6).

use std::time::Duration;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::Value;
use uuid::Uuid;

use super::dto::{ErrorResponse, PlaygroundAcceptedResponse, PlaygroundJobRequest};
use crate::app::AppState;
use crate::config::PlaygroundConfig;
use crate::job::{Job, JobStatus, Progress};
use crate::queue::QueueError;

const ASYNC_POLL_WINDOW: Duration = Duration::from_millis(50);
const POLL_INTERVAL: Duration = Duration::from_millis(5);

pub async fn create_playground_job(
    State(state): State<AppState>,
    Json(body): Json<PlaygroundJobRequest>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorResponse>)> {
    let is_async = body.r#async;
    let config = PlaygroundConfig::builder()
        .input(body.input)
        .retries(body.retries)
        .plugins(body.plugins)
        .webhook(body.webhook)
        .async_mode(body.r#async)
        .build()
        .map_err(|err| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::invalid_configuration(vec![err.as_issue()])),
            )
        })?;

    let job = state
        .playground_engine
        .create_job(config)
        .await
        .map_err(to_queue_error_response)?;
    let id = job.id;

    if is_async {
        // Returns as soon as the job leaves `queued`, or after a short
        // window if the dispatcher hasn't reached it yet (spec §8 scenario
        // 2: the body must carry `jobId` within ~50ms regardless of how
        // long the plugin run itself takes).
        let deadline = tokio::time::Instant::now() + ASYNC_POLL_WINDOW;
        loop {
            if let Some(job) = state.store.get(id) {
                if job.progress.status != JobStatus::Queued || tokio::time::Instant::now() >= deadline {
                    return Ok(Json(serde_json::to_value(PlaygroundAcceptedResponse {
                        job_id: id,
                        status: "accepted",
                        message: "Playground job accepted".to_string(),
                    })
                    .unwrap()));
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    loop {
        if let Some(job) = state.store.get(id) {
            if job.progress.status.is_terminal() {
                return Ok(Json(serde_json::to_value(&*job).unwrap()));
            }
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn to_queue_error_response(err: QueueError) -> (StatusCode, Json<ErrorResponse>) {
    let QueueError::Full(max_depth) = err;
    (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse::queue_full(max_depth)))
}

pub async fn start_playground_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, StatusCode> {
    // Idempotent re-start gate: the job is already queued/running/terminal
    // by the time a client can call this, so it only ever returns current
    // state — it never calls `start_job` directly (that's the dispatcher's
    // job alone).
    state.store.get(id).map(|job| Json((*job).clone())).ok_or(StatusCode::NOT_FOUND)
}

pub async fn get_playground_job(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Job>, StatusCode> {
    state.store.get(id).map(|job| Json((*job).clone())).ok_or(StatusCode::NOT_FOUND)
}

pub async fn get_playground_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Progress>, StatusCode> {
    state
        .store
        .get(id)
        .map(|job| Json(job.progress.clone()))
        .ok_or(StatusCode::NOT_FOUND)
}
