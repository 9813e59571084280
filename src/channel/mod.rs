//! Private channel naming.
//!
//! Channel names are computed from resource kind + id and never persisted.
//! The mapping is deterministic and injective per (kind, id) pair.

use std::fmt;

pub type UserId = i64;
pub type GroupId = i64;
pub type MessageId = i64;
pub type PlaceId = i64;

/// A private real-time channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Chat group channel (`group.<id>`), admitting current participants only
    Group(GroupId),
    /// Per-user notification feed (`notification.<user_id>`)
    Notification(UserId),
    /// Private push channel (`user.<id>`)
    User(UserId),
}

impl Channel {
    /// Derive the wire name for this channel.
    pub fn name(&self) -> String {
        match self {
            Channel::Group(id) => format!("group.{}", id),
            Channel::Notification(user_id) => format!("notification.{}", user_id),
            Channel::User(user_id) => format!("user.{}", user_id),
        }
    }

    /// Parse a wire name back into its typed form.
    ///
    /// Returns `None` for anything that is not a well-formed `kind.id` name
    /// with a known kind.
    pub fn parse(name: &str) -> Option<Channel> {
        let (kind, id) = name.split_once('.')?;
        let id: i64 = id.parse().ok()?;
        match kind {
            "group" => Some(Channel::Group(id)),
            "notification" => Some(Channel::Notification(id)),
            "user" => Some(Channel::User(id)),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
