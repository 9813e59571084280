use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub photo_api: PhotoApiConfig,
    #[serde(default)]
    pub blob: BlobConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// Pub/sub backend: "memory" or "redis"
    #[serde(default = "default_transport_backend")]
    pub backend: String,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Prefix prepended to every published channel name
    #[serde(default)]
    pub channel_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    /// Number of worker tasks consuming the job queue
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Bounded capacity of the job queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Attempt budget for transient external fetch failures
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Initial retry delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Maximum retry delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Per-attempt timeout for the external photo fetch, in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoApiConfig {
    #[serde(default = "default_photo_base_url")]
    pub base_url: String,
    pub key: Option<String>,
    #[serde(default = "default_photo_max_width")]
    pub max_width: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlobConfig {
    /// Public base URL that stored objects are served from
    #[serde(default = "default_blob_base_url")]
    pub public_base_url: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_transport_backend() -> String {
    "memory".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    256
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    5_000
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_photo_base_url() -> String {
    "https://maps.googleapis.com/maps/api/place/photo".to_string()
}

fn default_photo_max_width() -> u32 {
    1200
}

fn default_blob_base_url() -> String {
    "http://localhost:9000/media".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("transport.backend", "memory")?
            .set_default("transport.redis_url", "redis://localhost:6379")?
            .set_default("jobs.workers", 4)?
            .set_default("jobs.max_attempts", 3)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // SERVER_HOST, SERVER_PORT, JWT_SECRET, TRANSPORT_BACKEND, etc.
            .add_source(
                Environment::default()
                    .separator("_")
                    .try_parsing(true)
                    .list_separator(","),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            backend: default_transport_backend(),
            redis_url: default_redis_url(),
            channel_prefix: String::new(),
        }
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            fetch_timeout_seconds: default_fetch_timeout(),
        }
    }
}

impl Default for PhotoApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_photo_base_url(),
            key: None,
            max_width: default_photo_max_width(),
        }
    }
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            public_base_url: default_blob_base_url(),
        }
    }
}
