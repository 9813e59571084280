//! Prometheus metrics for the broadcast service.
//!
//! - Event metrics (published/failed by kind)
//! - Channel authorization decisions
//! - Delivery job metrics (enqueued, completed, failed, retries)

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "roam";

lazy_static! {
    /// Events published, labelled by event kind
    pub static ref EVENTS_PUBLISHED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_events_published_total", METRIC_PREFIX),
        "Total domain events published to the transport",
        &["kind"]
    )
    .unwrap();

    /// Publish failures
    pub static ref EVENTS_FAILED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_events_failed_total", METRIC_PREFIX),
        "Total publish failures surfaced by the transport"
    )
    .unwrap();

    /// Channel join decisions, labelled allow/deny
    pub static ref AUTH_DECISIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_auth_decisions_total", METRIC_PREFIX),
        "Total private-channel join decisions",
        &["decision"]
    )
    .unwrap();

    /// Jobs enqueued, labelled by job kind
    pub static ref JOBS_ENQUEUED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_jobs_enqueued_total", METRIC_PREFIX),
        "Total delivery jobs enqueued",
        &["kind"]
    )
    .unwrap();

    /// Jobs that reached Completed
    pub static ref JOBS_COMPLETED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_jobs_completed_total", METRIC_PREFIX),
        "Total delivery jobs completed",
        &["kind"]
    )
    .unwrap();

    /// Jobs that reached Failed
    pub static ref JOBS_FAILED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_jobs_failed_total", METRIC_PREFIX),
        "Total delivery jobs that failed terminally",
        &["kind"]
    )
    .unwrap();

    /// Transient fetch retries
    pub static ref JOB_RETRIES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_job_retries_total", METRIC_PREFIX),
        "Total transient fetch retries across all jobs"
    )
    .unwrap();
}

/// Encode all registered metrics in Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Helpers for event fan-out metrics.
pub struct EventMetrics;

impl EventMetrics {
    pub fn record_published(kind: &str) {
        EVENTS_PUBLISHED_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn record_failed() {
        EVENTS_FAILED_TOTAL.inc();
    }
}

/// Helpers for channel authorization metrics.
pub struct AuthMetrics;

impl AuthMetrics {
    pub fn record_allowed() {
        AUTH_DECISIONS_TOTAL.with_label_values(&["allow"]).inc();
    }

    pub fn record_denied() {
        AUTH_DECISIONS_TOTAL.with_label_values(&["deny"]).inc();
    }
}

/// Helpers for delivery job metrics.
pub struct JobMetrics;

impl JobMetrics {
    pub fn record_enqueued(kind: &str) {
        JOBS_ENQUEUED_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn record_completed(kind: &str) {
        JOBS_COMPLETED_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn record_failed(kind: &str) {
        JOBS_FAILED_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn record_retry() {
        JOB_RETRIES_TOTAL.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics() {
        EventMetrics::record_published("chat-message");
        AuthMetrics::record_denied();

        let output = encode_metrics().unwrap();
        assert!(output.contains("roam_events_published_total"));
        assert!(output.contains("roam_auth_decisions_total"));
    }
}
