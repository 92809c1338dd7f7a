//! Remote image download.
//!
//! The pipeline only needs "URL in, bytes or transport error out", so the
//! contract is the [`ImageSource`] trait. [`HttpImageSource`] implements it
//! with a shared reqwest client:
//!
//! - only `http` and `https` URLs are accepted
//! - the whole request is bounded by `fetch.timeout_secs`
//! - non-2xx responses are transport errors
//! - bodies larger than `fetch.max_download_bytes` are rejected, first by
//!   `Content-Length` and then by the streamed byte count
//!
//! There are no retries.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::Url;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::ImageError;

/// Source of raw image bytes
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, ImageError>;
}

/// Parse `url` and check that it uses a supported scheme.
pub fn validate_url(url: &str) -> Result<Url, ImageError> {
    let parsed =
        Url::parse(url).map_err(|e| ImageError::transport(format!("invalid URL '{url}': {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ImageError::transport(format!(
            "unsupported URL scheme '{other}', expected http or https"
        ))),
    }
}

/// Fetches images over HTTP(S).
#[derive(Clone)]
pub struct HttpImageSource {
    client: reqwest::Client,
    max_download_bytes: usize,
}

impl HttpImageSource {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            max_download_bytes: config.max_download_bytes,
        })
    }

    fn too_large(&self, size: u64) -> ImageError {
        ImageError::transport(format!(
            "response body of {} bytes exceeds limit of {} bytes",
            size, self.max_download_bytes
        ))
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<Bytes, ImageError> {
        let url = validate_url(url)?;
        let limit = self.max_download_bytes as u64;

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ImageError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::transport(format!(
                "HTTP request failed with status: {status}"
            )));
        }

        if let Some(length) = response.content_length() {
            if length > limit {
                return Err(self.too_large(length));
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ImageError::transport(format!("failed to read response body: {e}")))?
        {
            let received = (body.len() + chunk.len()) as u64;
            if received > limit {
                return Err(self.too_large(received));
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(url = %url, bytes = body.len(), status = status.as_u16(), "Fetched image");

        Ok(body.freeze())
    }
}
