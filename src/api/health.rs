//! Health check and statistics endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::dispatch::DispatcherStatsSnapshot;
use crate::jobs::JobQueueStatsSnapshot;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub transport: TransportHealthResponse,
    pub jobs: JobsHealthResponse,
}

#[derive(Debug, Serialize)]
pub struct TransportHealthResponse {
    pub backend: String,
}

#[derive(Debug, Serialize)]
pub struct JobsHealthResponse {
    pub queued: usize,
    pub running: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub events: DispatcherStatsSnapshot,
    pub jobs: JobQueueStatsSnapshot,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let job_stats = state.job_queue.stats();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        transport: TransportHealthResponse {
            backend: state.dispatcher.backend_type().to_string(),
        },
        jobs: JobsHealthResponse {
            queued: job_stats.queued,
            running: job_stats.running,
        },
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        events: state.dispatcher.stats(),
        jobs: state.job_queue.stats(),
    })
}
