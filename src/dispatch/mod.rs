//! Event fan-out dispatching.
//!
//! The dispatcher resolves (channel, event name, payload) from a domain event
//! and hands them to the configured transport. Publish failure is best-effort
//! by contract: it is logged and surfaced as a non-fatal error, and must never
//! unwind the business action that triggered it.

mod factory;
mod memory_transport;
mod redis_transport;
mod transport;

pub use factory::create_transport;
pub use memory_transport::MemoryTransport;
pub use redis_transport::RedisTransport;
pub use transport::{Envelope, Transport, TransportError};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::event::DomainEvent;
use crate::metrics::EventMetrics;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("transport publish failed: {0}")]
    Transport(#[from] TransportError),
}

/// Counters for the dispatcher.
#[derive(Debug, Default)]
pub struct DispatcherStats {
    /// Total events published
    pub published: AtomicU64,
    /// Total publish failures
    pub failed: AtomicU64,
    /// Events on group channels
    pub chat_events: AtomicU64,
    /// Events on notification channels
    pub notification_events: AtomicU64,
    /// Events on private user channels
    pub push_events: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            chat_events: self.chat_events.load(Ordering::Relaxed),
            notification_events: self.notification_events.load(Ordering::Relaxed),
            push_events: self.push_events.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatcher counters.
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub published: u64,
    pub failed: u64,
    pub chat_events: u64,
    pub notification_events: u64,
    pub push_events: u64,
}

/// Publishes domain events to the pub/sub transport.
pub struct EventDispatcher {
    transport: Arc<dyn Transport>,
    stats: DispatcherStats,
}

impl EventDispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            stats: DispatcherStats::default(),
        }
    }

    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn backend_type(&self) -> &'static str {
        self.transport.backend_type()
    }

    /// Resolve and publish a single event.
    ///
    /// Fire-and-forget from the caller's perspective: a transport failure is
    /// logged, counted, and returned as a `DispatchError` the caller is free
    /// to ignore.
    #[tracing::instrument(
        name = "dispatcher.publish",
        skip(self, event),
        fields(kind = event.kind())
    )]
    pub async fn publish(&self, event: &DomainEvent) -> Result<(), DispatchError> {
        let channel = event.channel().name();
        let event_name = event.event_name();
        let data = event.payload(Utc::now());

        match self.transport.publish(&channel, &event_name, data).await {
            Ok(()) => {
                self.stats.published.fetch_add(1, Ordering::Relaxed);
                self.record_kind(event);
                EventMetrics::record_published(event.kind());

                tracing::debug!(
                    channel = %channel,
                    event = %event_name,
                    "Published event"
                );

                Ok(())
            }
            Err(e) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                EventMetrics::record_failed();

                tracing::warn!(
                    channel = %channel,
                    event = %event_name,
                    error = %e,
                    "Publish failed, event dropped"
                );

                Err(DispatchError::Transport(e))
            }
        }
    }

    fn record_kind(&self, event: &DomainEvent) {
        let counter = match event {
            DomainEvent::NewChatMessage { .. }
            | DomainEvent::ChatDeleted { .. }
            | DomainEvent::ChatRelay { .. } => &self.stats.chat_events,
            DomainEvent::NewNotification { .. } => &self.stats.notification_events,
            DomainEvent::NewPrivatePush { .. } => &self.stats.push_events,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
