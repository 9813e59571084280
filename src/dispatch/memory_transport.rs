//! In-process broadcast transport.
//!
//! Single `tokio::sync::broadcast` hub carrying envelopes; subscribers filter
//! by channel locally. Serves single-node deployments and tests.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use super::transport::{Envelope, Transport, TransportError};

/// Slow receivers that fall behind will skip messages (RecvError::Lagged).
const BROADCAST_CAPACITY: usize = 4096;

pub struct MemoryTransport {
    sender: broadcast::Sender<Arc<Envelope>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    /// Subscribe to the hub. Each consumer gets its own receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Envelope>> {
        self.sender.subscribe()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        data: Value,
    ) -> Result<(), TransportError> {
        let envelope = Envelope {
            channel: channel.to_string(),
            event: event.to_string(),
            data,
        };
        // send() errs only when there are no receivers; an empty room is fine
        let _ = self.sender.send(Arc::new(envelope));
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_subscribers_receive_envelopes() {
        let transport = MemoryTransport::new();
        let mut rx = transport.subscribe();

        transport
            .publish("group.3", "chat.1", json!({"content": "hi"}))
            .await
            .unwrap();

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.channel, "group.3");
        assert_eq!(envelope.event, "chat.1");
        assert_eq!(envelope.data["content"], "hi");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_succeeds() {
        let transport = MemoryTransport::new();
        let result = transport.publish("group.3", "chat", json!({})).await;
        assert!(result.is_ok());
    }
}
