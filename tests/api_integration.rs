//! API handler integration tests
//!
//! Exercises the channel authorization callback and the trigger endpoints
//! against a fully wired application state, calling the handlers directly
//! with real JWTs and the in-process transport.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::Json;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use tokio::sync::broadcast;

use roam_broadcast_service::api::{
    authorize_channel, enqueue_push, job_status, publish_chat_deleted, publish_chat_message,
    ChannelAuthRequest, ChatDeletedRequest, ChatMessageRequest, PushRequest,
};
use roam_broadcast_service::auth::Claims;
use roam_broadcast_service::config::{
    BlobConfig, JobsConfig, JwtConfig, PhotoApiConfig, ServerConfig, Settings, TransportConfig,
};
use roam_broadcast_service::directory::{GroupRecord, UserRecord};
use roam_broadcast_service::dispatch::MemoryTransport;
use roam_broadcast_service::error::AppError;
use roam_broadcast_service::jobs::JobState;
use roam_broadcast_service::server::AppState;

const TEST_SECRET: &str = "integration-test-secret";

fn test_settings() -> Settings {
    Settings {
        server: ServerConfig::default(),
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            issuer: None,
            audience: None,
        },
        transport: TransportConfig::default(),
        jobs: JobsConfig {
            workers: 2,
            queue_capacity: 16,
            ..Default::default()
        },
        photo_api: PhotoApiConfig::default(),
        blob: BlobConfig::default(),
    }
}

struct TestApp {
    state: AppState,
    transport: Arc<MemoryTransport>,
    _shutdown: broadcast::Sender<()>,
}

fn test_app() -> TestApp {
    let transport = Arc::new(MemoryTransport::new());
    let (shutdown, _) = broadcast::channel(1);
    let state = AppState::new(test_settings(), transport.clone(), shutdown.clone());

    state.users.insert(UserRecord {
        id: 1,
        first_name: "Ada".to_string(),
        last_name: "Reyes".to_string(),
        username: "ada".to_string(),
        verified: true,
        avatar_url: None,
    });
    state.groups.insert(GroupRecord {
        id: 3,
        name: "lisbon-trip".to_string(),
        hash: "abc".to_string(),
    });
    state.groups.add_participant(3, 1);
    state.groups.add_participant(3, 5);

    TestApp {
        state,
        transport,
        _shutdown: shutdown,
    }
}

fn bearer_headers(user_id: i64) -> HeaderMap {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
        iat: chrono::Utc::now().timestamp(),
        roles: vec![],
        extra: Default::default(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    headers
}

#[tokio::test]
async fn test_channel_auth_grants_participant() {
    let app = test_app();

    let (status, Json(body)) = authorize_channel(
        State(app.state.clone()),
        bearer_headers(5),
        Json(ChannelAuthRequest {
            channel: "group.3".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(body.granted);
    assert_eq!(body.channel, "group.3");
}

#[tokio::test]
async fn test_channel_auth_denies_outsider() {
    let app = test_app();

    let (status, Json(body)) = authorize_channel(
        State(app.state.clone()),
        bearer_headers(9),
        Json(ChannelAuthRequest {
            channel: "group.3".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(!body.granted);
}

#[tokio::test]
async fn test_channel_auth_requires_token() {
    let app = test_app();

    let result = authorize_channel(
        State(app.state.clone()),
        HeaderMap::new(),
        Json(ChannelAuthRequest {
            channel: "group.3".to_string(),
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::Auth(_))));
}

#[tokio::test]
async fn test_channel_auth_rejects_unknown_channel_kind() {
    let app = test_app();

    let result = authorize_channel(
        State(app.state.clone()),
        bearer_headers(5),
        Json(ChannelAuthRequest {
            channel: "presence.3".to_string(),
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_chat_message_trigger_publishes() {
    let app = test_app();
    let mut rx = app.transport.subscribe();

    let Json(response) = publish_chat_message(
        State(app.state.clone()),
        Json(ChatMessageRequest {
            sender_id: 1,
            group_id: 3,
            message_id: 10,
            content: "hi".to_string(),
            created_at: None,
            updated_at: None,
        }),
    )
    .await
    .unwrap();

    assert!(response.published);
    assert_eq!(response.channel, "group.3");
    assert_eq!(response.event, "chat.1");

    let envelope = rx.recv().await.unwrap();
    assert_eq!(envelope.channel, "group.3");
    assert_eq!(envelope.data["content"], "hi");
    assert_eq!(envelope.data["sender"]["fullname"], "Ada Reyes");
}

#[tokio::test]
async fn test_chat_message_trigger_rejects_unknown_sender() {
    let app = test_app();

    let result = publish_chat_message(
        State(app.state.clone()),
        Json(ChatMessageRequest {
            sender_id: 404,
            group_id: 3,
            message_id: 10,
            content: "hi".to_string(),
            created_at: None,
            updated_at: None,
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_chat_deleted_trigger_uses_group_projection() {
    let app = test_app();
    let mut rx = app.transport.subscribe();

    let Json(response) = publish_chat_deleted(
        State(app.state.clone()),
        Json(ChatDeletedRequest {
            group_id: 3,
            message_id: 10,
        }),
    )
    .await
    .unwrap();

    assert_eq!(response.event, "chat");

    let envelope = rx.recv().await.unwrap();
    assert_eq!(envelope.data["group_name"], "lisbon-trip");
    assert_eq!(envelope.data["group_hash"], "abc");
    assert_eq!(envelope.data["status"], "delete");
    assert_eq!(envelope.data["message_id"], 10);
}

#[tokio::test]
async fn test_push_endpoint_round_trip() {
    let app = test_app();
    let mut rx = app.transport.subscribe();

    let (status, Json(accepted)) = enqueue_push(
        State(app.state.clone()),
        Json(PushRequest {
            user_id: 5,
            payload: json!({"badge": 3}),
        }),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(accepted.state, JobState::Queued);

    // The worker publishes once it picks the job up
    let envelope = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("worker should publish")
        .unwrap();
    assert_eq!(envelope.channel, "user.5");
    assert_eq!(envelope.data, json!({"badge": 3}));

    // Job status is observable until it reaches a terminal state
    let Json(status_body) = job_status(State(app.state.clone()), Path(accepted.job_id))
        .await
        .unwrap();
    assert!(matches!(
        status_body.state,
        JobState::Queued | JobState::Running | JobState::Completed
    ));
}

#[tokio::test]
async fn test_job_status_unknown_job() {
    let app = test_app();

    let result = job_status(
        State(app.state.clone()),
        Path(roam_broadcast_service::jobs::JobId::new_v4()),
    )
    .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}
