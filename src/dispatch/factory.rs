//! Transport factory.

use std::sync::Arc;

use crate::config::TransportConfig;

use super::memory_transport::MemoryTransport;
use super::redis_transport::RedisTransport;
use super::transport::Transport;

/// Create the pub/sub transport selected by configuration.
///
/// Falls back to the in-process broadcast hub when Redis is selected but
/// unreachable, so the service still comes up for local development.
pub async fn create_transport(config: &TransportConfig) -> Arc<dyn Transport> {
    match config.backend.as_str() {
        "redis" => {
            match RedisTransport::connect(&config.redis_url, config.channel_prefix.clone()).await {
                Ok(transport) => {
                    tracing::info!(url = %config.redis_url, "Using Redis transport");
                    Arc::new(transport)
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Redis transport unavailable, falling back to in-process broadcast"
                    );
                    Arc::new(MemoryTransport::new())
                }
            }
        }
        "memory" => {
            tracing::info!("Using in-process broadcast transport");
            Arc::new(MemoryTransport::new())
        }
        other => {
            tracing::warn!(
                backend = %other,
                "Unknown transport backend, using in-process broadcast"
            );
            Arc::new(MemoryTransport::new())
        }
    }
}
