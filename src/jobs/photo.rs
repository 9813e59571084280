//! External place photo fetching.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::config::PhotoApiConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Worth retrying: network trouble, timeouts, 5xx, rate limiting
    #[error("transient fetch failure: {0}")]
    Transient(String),

    /// Not worth retrying: the reference or request itself is bad
    #[error("permanent fetch failure: {0}")]
    Permanent(String),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }
}

/// Seam over the third-party photo API.
#[async_trait]
pub trait PhotoFetcher: Send + Sync {
    async fn fetch(&self, photo_ref: &str) -> Result<Bytes, FetchError>;
}

/// Fetches photo bytes from the external place photo API over HTTPS.
pub struct HttpPhotoFetcher {
    client: reqwest::Client,
    config: PhotoApiConfig,
}

impl HttpPhotoFetcher {
    pub fn new(config: PhotoApiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl PhotoFetcher for HttpPhotoFetcher {
    async fn fetch(&self, photo_ref: &str) -> Result<Bytes, FetchError> {
        let mut request = self.client.get(&self.config.base_url).query(&[
            ("maxwidth", self.config.max_width.to_string()),
            ("photoreference", photo_ref.to_string()),
        ]);

        if let Some(ref key) = self.config.key {
            request = request.query(&[("key", key.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(FetchError::Transient(format!("upstream returned {}", status)));
        }
        if !status.is_success() {
            return Err(FetchError::Permanent(format!("upstream returned {}", status)));
        }

        response
            .bytes()
            .await
            .map_err(|e| FetchError::Transient(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Transient("timeout".to_string()).is_transient());
        assert!(!FetchError::Permanent("404".to_string()).is_transient());
    }
}
