//! Directory seams over the persistence collaborator.
//!
//! The service never owns a schema; it reads users, groups and places through
//! these narrow traits. Only in-memory implementations ship with the service.

mod memory;

pub use memory::{MemoryGroupDirectory, MemoryPlaceDirectory, MemoryUserDirectory};

use async_trait::async_trait;
use thiserror::Error;

use crate::channel::{GroupId, PlaceId, UserId};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("unknown place: {0}")]
    UnknownPlace(PlaceId),
}

/// A user row projection, enough to render a sender.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub verified: bool,
    pub avatar_url: Option<String>,
}

/// A chat group row projection.
#[derive(Debug, Clone)]
pub struct GroupRecord {
    pub id: GroupId,
    pub name: String,
    pub hash: String,
}

/// A place row projection (travel destinations with an optional photo).
#[derive(Debug, Clone)]
pub struct PlaceRecord {
    pub id: PlaceId,
    pub name: String,
    pub image_url: Option<String>,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get(&self, id: UserId) -> Option<UserRecord>;
}

#[async_trait]
pub trait GroupDirectory: Send + Sync {
    async fn get(&self, id: GroupId) -> Option<GroupRecord>;

    /// Constant-time membership test against the group's current
    /// participant set. Unknown groups report `false`.
    async fn is_participant(&self, group_id: GroupId, user_id: UserId) -> bool;
}

#[async_trait]
pub trait PlaceDirectory: Send + Sync {
    async fn get(&self, id: PlaceId) -> Option<PlaceRecord>;

    async fn set_image_url(&self, id: PlaceId, url: String) -> Result<(), DirectoryError>;
}
