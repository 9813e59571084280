use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use crate::auth::JwtValidator;
use crate::authorizer::ChannelAuthorizer;
use crate::blob::MemoryBlobStore;
use crate::config::Settings;
use crate::directory::{MemoryGroupDirectory, MemoryPlaceDirectory, MemoryUserDirectory};
use crate::dispatch::{EventDispatcher, Transport};
use crate::jobs::{spawn_workers, HttpPhotoFetcher, JobContext, JobQueue, RetryPolicy};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub jwt_validator: Arc<JwtValidator>,
    pub authorizer: Arc<ChannelAuthorizer>,
    pub users: Arc<MemoryUserDirectory>,
    pub groups: Arc<MemoryGroupDirectory>,
    pub places: Arc<MemoryPlaceDirectory>,
    pub dispatcher: Arc<EventDispatcher>,
    pub job_queue: Arc<JobQueue>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        settings: Settings,
        transport: Arc<dyn Transport>,
        shutdown: broadcast::Sender<()>,
    ) -> Self {
        let jwt_validator = Arc::new(JwtValidator::new(&settings.jwt));

        let users = Arc::new(MemoryUserDirectory::new());
        let groups = Arc::new(MemoryGroupDirectory::new());
        let places = Arc::new(MemoryPlaceDirectory::new());
        let blobs = Arc::new(MemoryBlobStore::new(settings.blob.public_base_url.clone()));

        let authorizer = Arc::new(ChannelAuthorizer::new(groups.clone()));
        let dispatcher = Arc::new(EventDispatcher::new(transport));

        let job_context = Arc::new(JobContext {
            dispatcher: dispatcher.clone(),
            places: places.clone(),
            blobs,
            photos: Arc::new(HttpPhotoFetcher::new(settings.photo_api.clone())),
            retry: RetryPolicy::from_config(&settings.jobs),
            fetch_timeout: Duration::from_secs(settings.jobs.fetch_timeout_seconds),
        });
        let job_queue = Arc::new(spawn_workers(&settings.jobs, job_context, shutdown));

        Self {
            settings: Arc::new(settings),
            jwt_validator,
            authorizer,
            users,
            groups,
            places,
            dispatcher,
            job_queue,
            start_time: Instant::now(),
        }
    }
}
