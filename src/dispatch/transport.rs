use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Wire envelope published to the broker for every event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Channel the event belongs to (e.g. `group.3`)
    pub channel: String,
    /// Wire event name (e.g. `chat.1`)
    pub event: String,
    /// Shaped payload
    pub data: Value,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    #[error("failed to encode envelope: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Seam over the backing pub/sub broker.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Publish `data` under (channel, event).
    ///
    /// Delivery to zero subscribers is still a successful publish; only
    /// broker unavailability is an error.
    async fn publish(&self, channel: &str, event: &str, data: Value)
        -> Result<(), TransportError>;

    fn backend_type(&self) -> &'static str;
}
