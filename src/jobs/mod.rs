//! Asynchronous delivery jobs.
//!
//! Jobs are explicit values enqueued onto a bounded worker-pool channel so
//! the triggering request never blocks on external latency. A job moves
//! through `Queued -> Running -> {Completed | Failed}`; `Failed` is terminal,
//! and the retry budget for transient failures is spent while `Running`.

mod backoff;
mod photo;
mod worker;

pub use backoff::{ExponentialBackoff, RetryPolicy};
pub use photo::{FetchError, HttpPhotoFetcher, PhotoFetcher};
pub use worker::{
    spawn_workers, JobContext, JobError, JobQueue, JobQueueError, JobQueueStatsSnapshot,
};

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::channel::{PlaceId, UserId};

pub type JobId = Uuid;

/// A unit of asynchronous work consumed by the worker pool.
#[derive(Debug, Clone)]
pub enum Job {
    /// Fetch an external place photo, store it, update the place record
    FetchPlacePhoto { place_id: PlaceId, photo_ref: String },
    /// Publish an opaque push payload to a user's private channel
    RelayPush { user_id: UserId, payload: Value },
}

impl Job {
    /// Short tag used for logging and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Job::FetchPlacePhoto { .. } => "fetch-place-photo",
            Job::RelayPush { .. } => "relay-push",
        }
    }
}

/// Job lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}
