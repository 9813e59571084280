//! Domain events mirrored onto private channels.
//!
//! Each variant carries only the fields needed to render the event, never a
//! full entity graph. Payload shaping happens here so the dispatcher stays a
//! serialize-and-publish layer with no knowledge of entity schemas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::channel::{Channel, GroupId, MessageId, UserId};
use crate::directory::UserRecord;

/// Projection of the sending user embedded in chat payloads.
///
/// Always present in the payload; a sender without an avatar serializes the
/// `avatar` key as `null`, never drops it.
#[derive(Debug, Clone, Serialize)]
pub struct SenderProfile {
    pub id: UserId,
    pub avatar: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub fullname: String,
    pub username: String,
    pub verified: bool,
}

impl SenderProfile {
    pub fn from_user(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            avatar: user.avatar_url.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            fullname: format!("{} {}", user.first_name, user.last_name),
            username: user.username.clone(),
            verified: user.verified,
        }
    }
}

/// The chat message fields carried by `NewChatMessage`.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: MessageId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flat projection of a notification row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub rel_user_id: UserId,
    pub content: String,
    pub notifiable_type: String,
    pub notifiable_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A typed notification of a state change, destined for one private channel.
///
/// Constructed, serialized and discarded within a single publish; there is no
/// retention or replay log.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A chat message was persisted to a group
    NewChatMessage {
        sender: SenderProfile,
        group_id: GroupId,
        message: ChatMessage,
    },
    /// A chat message was deleted from a group
    ChatDeleted {
        group_id: GroupId,
        group_name: String,
        group_hash: String,
        message_id: MessageId,
    },
    /// A notification row was created for a user
    NewNotification {
        user_id: UserId,
        notification: NotificationRecord,
    },
    /// An opaque push payload for a user's private channel, forwarded verbatim
    NewPrivatePush { user_id: UserId, payload: Value },
    /// A lightweight system relay onto a group channel
    ChatRelay {
        group_id: GroupId,
        group_name: String,
        group_hash: String,
        sender_id: UserId,
        content: String,
    },
}

impl DomainEvent {
    /// The channel this event broadcasts on.
    pub fn channel(&self) -> Channel {
        match self {
            DomainEvent::NewChatMessage { group_id, .. } => Channel::Group(*group_id),
            DomainEvent::ChatDeleted { group_id, .. } => Channel::Group(*group_id),
            DomainEvent::NewNotification { user_id, .. } => Channel::Notification(*user_id),
            DomainEvent::NewPrivatePush { user_id, .. } => Channel::User(*user_id),
            DomainEvent::ChatRelay { group_id, .. } => Channel::Group(*group_id),
        }
    }

    /// The wire event name distinguishing subtypes on the same channel.
    pub fn event_name(&self) -> String {
        match self {
            DomainEvent::NewChatMessage { sender, .. } => format!("chat.{}", sender.id),
            DomainEvent::ChatDeleted { .. } => "chat".to_string(),
            DomainEvent::NewNotification { .. } => "new-notification-event".to_string(),
            DomainEvent::NewPrivatePush { .. } => "notification".to_string(),
            DomainEvent::ChatRelay { .. } => "chat".to_string(),
        }
    }

    /// Short tag used for logging and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::NewChatMessage { .. } => "chat-message",
            DomainEvent::ChatDeleted { .. } => "chat-deleted",
            DomainEvent::NewNotification { .. } => "notification",
            DomainEvent::NewPrivatePush { .. } => "private-push",
            DomainEvent::ChatRelay { .. } => "chat-relay",
        }
    }

    /// Serializable payload for this event.
    ///
    /// `now` is injected so the relative `message_time` string reflects
    /// publish time rather than construction time.
    pub fn payload(&self, now: DateTime<Utc>) -> Value {
        match self {
            DomainEvent::NewChatMessage {
                sender,
                group_id,
                message,
            } => json!({
                "id": message.id,
                "sender": sender,
                "group_id": group_id,
                "content": message.content,
                "created_at": message.created_at,
                "updated_at": message.updated_at,
                "message_time": relative_time(message.created_at, now),
            }),
            DomainEvent::ChatDeleted {
                group_name,
                group_hash,
                message_id,
                ..
            } => json!({
                "group_name": group_name,
                "group_hash": group_hash,
                "status": "delete",
                "message_id": message_id,
            }),
            DomainEvent::NewNotification { notification, .. } => json!({
                "rel_user_id": notification.rel_user_id,
                "content": notification.content,
                "notifiable_type": notification.notifiable_type,
                "notifiable_id": notification.notifiable_id,
                "type": notification.kind,
            }),
            DomainEvent::NewPrivatePush { payload, .. } => payload.clone(),
            DomainEvent::ChatRelay {
                group_name,
                group_hash,
                sender_id,
                content,
                ..
            } => json!({
                "group_name": group_name,
                "group_hash": group_hash,
                "content": content,
                "sender_id": sender_id,
            }),
        }
    }
}

/// Coarse human-relative rendering of a message age.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    if secs < 60 {
        // Includes future timestamps from clock skew
        return "just now".to_string();
    }

    let mins = secs / 60;
    if mins < 60 {
        return plural(mins, "minute");
    }

    let hours = mins / 60;
    if hours < 24 {
        return plural(hours, "hour");
    }

    let days = hours / 24;
    if days < 7 {
        return plural(days, "day");
    }
    if days < 30 {
        return plural(days / 7, "week");
    }
    if days < 365 {
        return plural(days / 30, "month");
    }
    plural(days / 365, "year")
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}
