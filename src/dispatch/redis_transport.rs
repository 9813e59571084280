//! Redis pub/sub transport.
//!
//! Publishes each envelope as JSON via `PUBLISH <prefix><channel>` over a
//! managed async connection that reconnects on its own.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;

use super::transport::{Envelope, Transport, TransportError};

pub struct RedisTransport {
    conn: ConnectionManager,
    channel_prefix: String,
}

impl RedisTransport {
    pub async fn connect(
        url: &str,
        channel_prefix: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let client =
            redis::Client::open(url).map_err(|e| TransportError::Unavailable(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;

        Ok(Self {
            conn,
            channel_prefix: channel_prefix.into(),
        })
    }
}

#[async_trait]
impl Transport for RedisTransport {
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
        let body = serde_json::to_string(&envelope)?;

        let mut conn = self.conn.clone();
        let subscribers: i64 = conn
            .publish(format!("{}{}", self.channel_prefix, channel), body)
            .await
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;

        tracing::debug!(
            channel = %channel,
            event = %event,
            subscribers = subscribers,
            "Published envelope to Redis"
        );

        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "redis"
    }
}
