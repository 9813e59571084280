use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::channel_auth::authorize_channel;
use super::events::{
    publish_chat_deleted, publish_chat_message, publish_chat_relay, publish_notification,
};
use super::health::{health, stats};
use super::jobs::{enqueue_place_photo, enqueue_push, job_status};
use super::metrics::prometheus_metrics;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health & Stats
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        // Channel join authorization callback
        .route("/broadcasting/auth", post(authorize_channel))
        // Event triggers & jobs
        .nest(
            "/api/v1",
            Router::new()
                .route("/events/chat-message", post(publish_chat_message))
                .route("/events/chat-deleted", post(publish_chat_deleted))
                .route("/events/chat-relay", post(publish_chat_relay))
                .route("/events/notification", post(publish_notification))
                .route("/push", post(enqueue_push))
                .route("/places/{id}/photo", post(enqueue_place_photo))
                .route("/jobs/{id}", get(job_status)),
        )
}
