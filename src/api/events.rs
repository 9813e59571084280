//! Event trigger handlers.
//!
//! The mutating business action has already committed upstream; these
//! handlers shape the corresponding domain event and publish it.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::{GroupId, MessageId, UserId};
use crate::directory::{GroupDirectory, UserDirectory};
use crate::error::{AppError, Result};
use crate::event::{ChatMessage, DomainEvent, NotificationRecord, SenderProfile};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub published: bool,
    pub channel: String,
    pub event: String,
    pub timestamp: DateTime<Utc>,
}

impl PublishResponse {
    fn for_event(event: &DomainEvent) -> Self {
        Self {
            published: true,
            channel: event.channel().name(),
            event: event.event_name(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatMessageRequest {
    pub sender_id: UserId,
    pub group_id: GroupId,
    pub message_id: MessageId,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Publish a `NewChatMessage` event for a message already persisted upstream.
#[tracing::instrument(
    name = "http.publish_chat_message",
    skip(state, request),
    fields(group_id = request.group_id, sender_id = request.sender_id)
)]
pub async fn publish_chat_message(
    State(state): State<AppState>,
    Json(request): Json<ChatMessageRequest>,
) -> Result<Json<PublishResponse>> {
    let sender = state
        .users
        .get(request.sender_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Unknown user: {}", request.sender_id)))?;

    let created_at = request.created_at.unwrap_or_else(Utc::now);
    let event = DomainEvent::NewChatMessage {
        sender: SenderProfile::from_user(&sender),
        group_id: request.group_id,
        message: ChatMessage {
            id: request.message_id,
            content: request.content,
            created_at,
            updated_at: request.updated_at.unwrap_or(created_at),
        },
    };

    let response = PublishResponse::for_event(&event);
    state.dispatcher.publish(&event).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct ChatDeletedRequest {
    pub group_id: GroupId,
    pub message_id: MessageId,
}

/// Publish a `ChatDeleted` event for a message removed upstream.
#[tracing::instrument(
    name = "http.publish_chat_deleted",
    skip(state, request),
    fields(group_id = request.group_id, message_id = request.message_id)
)]
pub async fn publish_chat_deleted(
    State(state): State<AppState>,
    Json(request): Json<ChatDeletedRequest>,
) -> Result<Json<PublishResponse>> {
    let group = state
        .groups
        .get(request.group_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Unknown group: {}", request.group_id)))?;

    let event = DomainEvent::ChatDeleted {
        group_id: group.id,
        group_name: group.name,
        group_hash: group.hash,
        message_id: request.message_id,
    };

    let response = PublishResponse::for_event(&event);
    state.dispatcher.publish(&event).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct ChatRelayRequest {
    pub group_id: GroupId,
    pub sender_id: UserId,
    pub content: String,
}

/// Publish a lightweight `ChatRelay` onto a group channel.
#[tracing::instrument(
    name = "http.publish_chat_relay",
    skip(state, request),
    fields(group_id = request.group_id)
)]
pub async fn publish_chat_relay(
    State(state): State<AppState>,
    Json(request): Json<ChatRelayRequest>,
) -> Result<Json<PublishResponse>> {
    let group = state
        .groups
        .get(request.group_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Unknown group: {}", request.group_id)))?;

    let event = DomainEvent::ChatRelay {
        group_id: group.id,
        group_name: group.name,
        group_hash: group.hash,
        sender_id: request.sender_id,
        content: request.content,
    };

    let response = PublishResponse::for_event(&event);
    state.dispatcher.publish(&event).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct NotificationEventRequest {
    pub user_id: UserId,
    #[serde(flatten)]
    pub notification: NotificationRecord,
}

/// Publish a `NewNotification` onto the owner's notification channel.
#[tracing::instrument(
    name = "http.publish_notification",
    skip(state, request),
    fields(user_id = request.user_id)
)]
pub async fn publish_notification(
    State(state): State<AppState>,
    Json(request): Json<NotificationEventRequest>,
) -> Result<Json<PublishResponse>> {
    let event = DomainEvent::NewNotification {
        user_id: request.user_id,
        notification: request.notification,
    };

    let response = PublishResponse::for_event(&event);
    state.dispatcher.publish(&event).await?;
    Ok(Json(response))
}
