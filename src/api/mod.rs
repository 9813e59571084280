//! API layer - HTTP endpoint handlers organized by domain.

mod channel_auth;
mod events;
mod health;
mod jobs;
mod metrics;
mod routes;

pub use channel_auth::{authorize_channel, ChannelAuthRequest, ChannelAuthResponse};
pub use events::{
    publish_chat_deleted, publish_chat_message, publish_chat_relay, publish_notification,
    ChatDeletedRequest, ChatMessageRequest, ChatRelayRequest, NotificationEventRequest,
    PublishResponse,
};
pub use health::{health, stats};
pub use jobs::{
    enqueue_place_photo, enqueue_push, job_status, JobAcceptedResponse, JobStatusResponse,
    PlacePhotoRequest, PushRequest,
};
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
