//! Delivery job endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::channel::{PlaceId, UserId};
use crate::error::{AppError, Result};
use crate::jobs::{Job, JobId, JobQueueError, JobState};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct PushRequest {
    pub user_id: UserId,
    /// Forwarded verbatim to the user's private channel
    pub payload: Value,
}

#[derive(Debug, Deserialize)]
pub struct PlacePhotoRequest {
    pub photo_ref: String,
}

#[derive(Debug, Serialize)]
pub struct JobAcceptedResponse {
    pub job_id: JobId,
    pub state: JobState,
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: JobId,
    pub state: JobState,
}

/// Enqueue a push relay job; the publish happens off the request path.
#[tracing::instrument(
    name = "http.enqueue_push",
    skip(state, request),
    fields(user_id = request.user_id)
)]
pub async fn enqueue_push(
    State(state): State<AppState>,
    Json(request): Json<PushRequest>,
) -> Result<(StatusCode, Json<JobAcceptedResponse>)> {
    let job_id = state
        .job_queue
        .enqueue(Job::RelayPush {
            user_id: request.user_id,
            payload: request.payload,
        })
        .map_err(queue_error)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(JobAcceptedResponse {
            job_id,
            state: JobState::Queued,
        }),
    ))
}

/// Enqueue an external photo fetch for a place.
#[tracing::instrument(name = "http.enqueue_place_photo", skip(state, request))]
pub async fn enqueue_place_photo(
    State(state): State<AppState>,
    Path(place_id): Path<PlaceId>,
    Json(request): Json<PlacePhotoRequest>,
) -> Result<(StatusCode, Json<JobAcceptedResponse>)> {
    let job_id = state
        .job_queue
        .enqueue(Job::FetchPlacePhoto {
            place_id,
            photo_ref: request.photo_ref,
        })
        .map_err(queue_error)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(JobAcceptedResponse {
            job_id,
            state: JobState::Queued,
        }),
    ))
}

/// Look up the state of a previously enqueued job.
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> Result<Json<JobStatusResponse>> {
    let job_state = state
        .job_queue
        .status(job_id)
        .ok_or_else(|| AppError::NotFound(format!("Unknown job: {}", job_id)))?;

    Ok(Json(JobStatusResponse {
        job_id,
        state: job_state,
    }))
}

fn queue_error(e: JobQueueError) -> AppError {
    AppError::Unavailable(e.to_string())
}
