mod settings;

pub use settings::{
    BlobConfig, JobsConfig, JwtConfig, PhotoApiConfig, ServerConfig, Settings, TransportConfig,
};
