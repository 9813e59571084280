//! Blob storage seam.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob store unavailable: {0}")]
    Unavailable(String),
}

/// `put(key, bytes) -> url` against the external object store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Bytes) -> Result<String, BlobError>;
}

/// In-memory blob store for tests and single-node deployments.
pub struct MemoryBlobStore {
    objects: DashMap<String, Bytes>,
    public_base_url: String,
}

impl MemoryBlobStore {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            objects: DashMap::new(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.objects.get(key).map(|b| b.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Bytes) -> Result<String, BlobError> {
        self.objects.insert(key.to_string(), bytes);
        Ok(format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            key
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_returns_public_url() {
        let store = MemoryBlobStore::new("http://cdn.example/media/");
        let url = store
            .put("place-photos/1-lisbon", Bytes::from_static(b"jpeg"))
            .await
            .unwrap();

        assert_eq!(url, "http://cdn.example/media/place-photos/1-lisbon");
        assert_eq!(
            store.object("place-photos/1-lisbon"),
            Some(Bytes::from_static(b"jpeg"))
        );
        assert_eq!(store.len(), 1);
    }
}
