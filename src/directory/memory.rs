//! In-memory directory implementations using DashMap.
//!
//! Participant sets are indexed as hash sets so the authorizer's membership
//! test never scans a participant list.

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::channel::{GroupId, PlaceId, UserId};

use super::{
    DirectoryError, GroupDirectory, GroupRecord, PlaceDirectory, PlaceRecord, UserDirectory,
    UserRecord,
};

#[derive(Default)]
pub struct MemoryUserDirectory {
    users: DashMap<UserId, UserRecord>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: UserRecord) {
        self.users.insert(user.id, user);
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn get(&self, id: UserId) -> Option<UserRecord> {
        self.users.get(&id).map(|r| r.clone())
    }
}

#[derive(Default)]
pub struct MemoryGroupDirectory {
    groups: DashMap<GroupId, GroupRecord>,
    /// group_id -> participant set
    participants: DashMap<GroupId, HashSet<UserId>>,
}

impl MemoryGroupDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, group: GroupRecord) {
        self.participants.entry(group.id).or_default();
        self.groups.insert(group.id, group);
    }

    pub fn add_participant(&self, group_id: GroupId, user_id: UserId) {
        self.participants.entry(group_id).or_default().insert(user_id);
    }

    pub fn remove_participant(&self, group_id: GroupId, user_id: UserId) {
        if let Some(mut set) = self.participants.get_mut(&group_id) {
            set.remove(&user_id);
        }
    }
}

#[async_trait]
impl GroupDirectory for MemoryGroupDirectory {
    async fn get(&self, id: GroupId) -> Option<GroupRecord> {
        self.groups.get(&id).map(|r| r.clone())
    }

    async fn is_participant(&self, group_id: GroupId, user_id: UserId) -> bool {
        self.participants
            .get(&group_id)
            .map(|set| set.contains(&user_id))
            .unwrap_or(false)
    }
}

#[derive(Default)]
pub struct MemoryPlaceDirectory {
    places: DashMap<PlaceId, PlaceRecord>,
}

impl MemoryPlaceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, place: PlaceRecord) {
        self.places.insert(place.id, place);
    }
}

#[async_trait]
impl PlaceDirectory for MemoryPlaceDirectory {
    async fn get(&self, id: PlaceId) -> Option<PlaceRecord> {
        self.places.get(&id).map(|r| r.clone())
    }

    async fn set_image_url(&self, id: PlaceId, url: String) -> Result<(), DirectoryError> {
        match self.places.get_mut(&id) {
            Some(mut place) => {
                place.image_url = Some(url);
                Ok(())
            }
            None => Err(DirectoryError::UnknownPlace(id)),
        }
    }
}
