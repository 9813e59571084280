//! Worker pool consuming delivery jobs off the request path.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use futures::future::join_all;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::time::timeout;

use crate::blob::{BlobError, BlobStore};
use crate::channel::PlaceId;
use crate::config::JobsConfig;
use crate::directory::{DirectoryError, PlaceDirectory};
use crate::dispatch::{DispatchError, EventDispatcher};
use crate::event::DomainEvent;
use crate::metrics::JobMetrics;

use super::photo::{FetchError, PhotoFetcher};
use super::{Job, JobId, JobState, RetryPolicy};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("unknown place: {0}")]
    UnknownPlace(PlaceId),

    #[error("photo fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("blob store failed: {0}")]
    Blob(#[from] BlobError),

    #[error("directory update failed: {0}")]
    Directory(#[from] DirectoryError),

    #[error("event dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
}

#[derive(Debug, Error)]
pub enum JobQueueError {
    #[error("job queue is full")]
    Full,

    #[error("job queue is shut down")]
    Closed,
}

/// Shared collaborators every job execution may need.
pub struct JobContext {
    pub dispatcher: Arc<EventDispatcher>,
    pub places: Arc<dyn PlaceDirectory>,
    pub blobs: Arc<dyn BlobStore>,
    pub photos: Arc<dyn PhotoFetcher>,
    pub retry: RetryPolicy,
    /// Per-attempt timeout on the external photo fetch
    pub fetch_timeout: Duration,
}

struct QueuedJob {
    id: JobId,
    job: Job,
}

/// Handle for enqueueing jobs and observing their states.
pub struct JobQueue {
    tx: mpsc::Sender<QueuedJob>,
    states: Arc<DashMap<JobId, JobState>>,
}

/// Snapshot of job states across the queue's lifetime.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JobQueueStatsSnapshot {
    pub queued: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

impl JobQueue {
    /// Enqueue a job for asynchronous execution.
    pub fn enqueue(&self, job: Job) -> Result<JobId, JobQueueError> {
        let id = JobId::new_v4();
        let kind = job.kind();

        self.states.insert(id, JobState::Queued);
        match self.tx.try_send(QueuedJob { id, job }) {
            Ok(()) => {
                JobMetrics::record_enqueued(kind);
                tracing::debug!(job_id = %id, kind = kind, "Job enqueued");
                Ok(id)
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.states.remove(&id);
                tracing::warn!(kind = kind, "Job queue full, rejecting job");
                Err(JobQueueError::Full)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.states.remove(&id);
                Err(JobQueueError::Closed)
            }
        }
    }

    /// Current state of a job, if it is known.
    pub fn status(&self, id: JobId) -> Option<JobState> {
        self.states.get(&id).map(|s| *s)
    }

    pub fn stats(&self) -> JobQueueStatsSnapshot {
        let mut snapshot = JobQueueStatsSnapshot {
            queued: 0,
            running: 0,
            completed: 0,
            failed: 0,
        };
        for entry in self.states.iter() {
            match *entry.value() {
                JobState::Queued => snapshot.queued += 1,
                JobState::Running => snapshot.running += 1,
                JobState::Completed => snapshot.completed += 1,
                JobState::Failed => snapshot.failed += 1,
            }
        }
        snapshot
    }
}

/// Spawn the worker pool and return the queue handle.
///
/// Workers run until the shutdown signal fires or the queue closes.
pub fn spawn_workers(
    config: &JobsConfig,
    ctx: Arc<JobContext>,
    shutdown: broadcast::Sender<()>,
) -> JobQueue {
    let (tx, rx) = mpsc::channel(config.queue_capacity);
    let rx = Arc::new(Mutex::new(rx));
    let states: Arc<DashMap<JobId, JobState>> = Arc::new(DashMap::new());

    let mut handles = Vec::with_capacity(config.workers.max(1));
    for worker_id in 0..config.workers.max(1) {
        let rx = rx.clone();
        let states = states.clone();
        let ctx = ctx.clone();
        let mut shutdown_rx = shutdown.subscribe();

        handles.push(tokio::spawn(async move {
            tracing::debug!(worker_id = worker_id, "Job worker started");
            loop {
                let queued = tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    queued = async { rx.lock().await.recv().await } => match queued {
                        Some(queued) => queued,
                        None => break,
                    },
                };

                run_job(&ctx, &states, queued).await;
            }
            tracing::debug!(worker_id = worker_id, "Job worker stopped");
        }));
    }

    // Supervisor logs once the whole pool has drained after shutdown
    tokio::spawn(async move {
        join_all(handles).await;
        tracing::info!("All job workers stopped");
    });

    JobQueue { tx, states }
}

async fn run_job(ctx: &JobContext, states: &DashMap<JobId, JobState>, queued: QueuedJob) {
    let QueuedJob { id, job } = queued;
    let kind = job.kind();

    states.insert(id, JobState::Running);

    match execute(ctx, &job).await {
        Ok(()) => {
            states.insert(id, JobState::Completed);
            JobMetrics::record_completed(kind);
            tracing::info!(job_id = %id, kind = kind, "Job completed");
        }
        Err(e) => {
            states.insert(id, JobState::Failed);
            JobMetrics::record_failed(kind);
            tracing::warn!(job_id = %id, kind = kind, error = %e, "Job failed");
        }
    }
}

async fn execute(ctx: &JobContext, job: &Job) -> Result<(), JobError> {
    match job {
        Job::RelayPush { user_id, payload } => {
            let event = DomainEvent::NewPrivatePush {
                user_id: *user_id,
                payload: payload.clone(),
            };
            ctx.dispatcher.publish(&event).await?;
            Ok(())
        }
        Job::FetchPlacePhoto {
            place_id,
            photo_ref,
        } => fetch_place_photo(ctx, *place_id, photo_ref).await,
    }
}

async fn fetch_place_photo(
    ctx: &JobContext,
    place_id: PlaceId,
    photo_ref: &str,
) -> Result<(), JobError> {
    let place = ctx
        .places
        .get(place_id)
        .await
        .ok_or(JobError::UnknownPlace(place_id))?;

    let bytes = fetch_with_retry(ctx, photo_ref).await?;

    let key = format!("place-photos/{}-{}", Utc::now().timestamp_millis(), place.id);
    let url = ctx.blobs.put(&key, bytes).await?;
    ctx.places.set_image_url(place_id, url.clone()).await?;

    tracing::debug!(place_id = place_id, url = %url, "Stored place photo");
    Ok(())
}

/// Retry transient fetch failures with backoff; permanent failures and an
/// exhausted attempt budget surface immediately.
async fn fetch_with_retry(ctx: &JobContext, photo_ref: &str) -> Result<Bytes, JobError> {
    let mut backoff = ctx.retry.backoff();
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let error = match timeout(ctx.fetch_timeout, ctx.photos.fetch(photo_ref)).await {
            Ok(Ok(bytes)) => return Ok(bytes),
            Ok(Err(e)) => e,
            Err(_) => FetchError::Transient(format!(
                "fetch timed out after {}s",
                ctx.fetch_timeout.as_secs()
            )),
        };

        if !error.is_transient() || attempt >= ctx.retry.max_attempts {
            return Err(JobError::Fetch(error));
        }

        let delay = backoff.next_delay();
        JobMetrics::record_retry();
        tracing::warn!(
            attempt = attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Transient photo fetch failure, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::blob::MemoryBlobStore;
    use crate::directory::{MemoryPlaceDirectory, PlaceRecord};
    use crate::dispatch::MemoryTransport;

    /// Fetcher that plays back a script of results.
    struct ScriptedFetcher {
        script: StdMutex<VecDeque<Result<Bytes, FetchError>>>,
    }

    impl ScriptedFetcher {
        fn new(script: Vec<Result<Bytes, FetchError>>) -> Self {
            Self {
                script: StdMutex::new(script.into()),
            }
        }
    }

    #[async_trait]
    impl PhotoFetcher for ScriptedFetcher {
        async fn fetch(&self, _photo_ref: &str) -> Result<Bytes, FetchError> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(FetchError::Permanent("script exhausted".to_string())))
        }
    }

    struct TestHarness {
        queue: JobQueue,
        transport: Arc<MemoryTransport>,
        places: Arc<MemoryPlaceDirectory>,
        blobs: Arc<MemoryBlobStore>,
        _shutdown: broadcast::Sender<()>,
    }

    fn harness(fetcher: ScriptedFetcher) -> TestHarness {
        let transport = Arc::new(MemoryTransport::new());
        let dispatcher = Arc::new(EventDispatcher::new(transport.clone()));
        let places = Arc::new(MemoryPlaceDirectory::new());
        places.insert(PlaceRecord {
            id: 1,
            name: "Lisbon".to_string(),
            image_url: None,
        });
        let blobs = Arc::new(MemoryBlobStore::new("http://cdn.test/media"));

        let ctx = Arc::new(JobContext {
            dispatcher,
            places: places.clone(),
            blobs: blobs.clone(),
            photos: Arc::new(fetcher),
            retry: RetryPolicy {
                max_attempts: 3,
                initial_delay_ms: 1,
                max_delay_ms: 5,
                multiplier: 2.0,
                jitter_factor: 0.0,
            },
            fetch_timeout: Duration::from_secs(1),
        });

        let (shutdown, _) = broadcast::channel(1);
        let queue = spawn_workers(
            &JobsConfig {
                workers: 2,
                queue_capacity: 16,
                ..Default::default()
            },
            ctx,
            shutdown.clone(),
        );

        TestHarness {
            queue,
            transport,
            places,
            blobs,
            _shutdown: shutdown,
        }
    }

    async fn wait_for_terminal(queue: &JobQueue, id: JobId) -> JobState {
        for _ in 0..200 {
            if let Some(state) = queue.status(id) {
                if state.is_terminal() {
                    return state;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} never reached a terminal state", id);
    }

    #[tokio::test]
    async fn test_relay_push_publishes_on_completion() {
        let h = harness(ScriptedFetcher::new(vec![]));
        let mut rx = h.transport.subscribe();

        let id = h
            .queue
            .enqueue(Job::RelayPush {
                user_id: 5,
                payload: json!({"badge": 2}),
            })
            .unwrap();

        assert_eq!(wait_for_terminal(&h.queue, id).await, JobState::Completed);

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.channel, "user.5");
        assert_eq!(envelope.event, "notification");
        assert_eq!(envelope.data, json!({"badge": 2}));
    }

    #[tokio::test]
    async fn test_photo_job_stores_blob_and_updates_place() {
        let h = harness(ScriptedFetcher::new(vec![Ok(Bytes::from_static(b"jpeg"))]));

        let id = h
            .queue
            .enqueue(Job::FetchPlacePhoto {
                place_id: 1,
                photo_ref: "ref-1".to_string(),
            })
            .unwrap();

        assert_eq!(wait_for_terminal(&h.queue, id).await, JobState::Completed);
        assert_eq!(h.blobs.len(), 1);

        let place = h.places.get(1).await.unwrap();
        let url = place.image_url.expect("image url should be set");
        assert!(url.starts_with("http://cdn.test/media/place-photos/"));
    }

    #[tokio::test]
    async fn test_transient_failures_retry_until_success() {
        let h = harness(ScriptedFetcher::new(vec![
            Err(FetchError::Transient("503".to_string())),
            Err(FetchError::Transient("timeout".to_string())),
            Ok(Bytes::from_static(b"jpeg")),
        ]));

        let id = h
            .queue
            .enqueue(Job::FetchPlacePhoto {
                place_id: 1,
                photo_ref: "ref-1".to_string(),
            })
            .unwrap();

        assert_eq!(wait_for_terminal(&h.queue, id).await, JobState::Completed);
        assert!(h.places.get(1).await.unwrap().image_url.is_some());
    }

    #[tokio::test]
    async fn test_exhausted_attempts_fail_terminally() {
        let h = harness(ScriptedFetcher::new(vec![
            Err(FetchError::Transient("503".to_string())),
            Err(FetchError::Transient("503".to_string())),
            Err(FetchError::Transient("503".to_string())),
            Ok(Bytes::from_static(b"never reached")),
        ]));

        let id = h
            .queue
            .enqueue(Job::FetchPlacePhoto {
                place_id: 1,
                photo_ref: "ref-1".to_string(),
            })
            .unwrap();

        assert_eq!(wait_for_terminal(&h.queue, id).await, JobState::Failed);
        assert!(h.places.get(1).await.unwrap().image_url.is_none());
    }

    #[tokio::test]
    async fn test_permanent_failure_does_not_retry() {
        let h = harness(ScriptedFetcher::new(vec![
            Err(FetchError::Permanent("404".to_string())),
            Ok(Bytes::from_static(b"never reached")),
        ]));

        let id = h
            .queue
            .enqueue(Job::FetchPlacePhoto {
                place_id: 1,
                photo_ref: "bad-ref".to_string(),
            })
            .unwrap();

        assert_eq!(wait_for_terminal(&h.queue, id).await, JobState::Failed);
        // The success scripted after the permanent failure was never consumed
        assert!(h.blobs.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_place_fails() {
        let h = harness(ScriptedFetcher::new(vec![Ok(Bytes::from_static(b"jpeg"))]));

        let id = h
            .queue
            .enqueue(Job::FetchPlacePhoto {
                place_id: 404,
                photo_ref: "ref-1".to_string(),
            })
            .unwrap();

        assert_eq!(wait_for_terminal(&h.queue, id).await, JobState::Failed);
    }

    #[tokio::test]
    async fn test_unknown_job_has_no_status() {
        let h = harness(ScriptedFetcher::new(vec![]));
        assert_eq!(h.queue.status(JobId::new_v4()), None);
    }
}
