//! HTTP client for the segmentation endpoints

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::types::{ApiError, StatusPayload};

/// Path that begins a segmentation job
pub const SEGMENT_PATH: &str = "/segment";
/// Path that reports job status and progress
pub const STATUS_PATH: &str = "/check_segment_status";

/// Server-side segmentation job API
#[async_trait]
pub trait SegmentationApi: Send + Sync {
    /// Begin a job. Only success or failure matters, the body is ignored.
    async fn start_job(&self) -> Result<(), ApiError>;

    /// Fetch current status and progress
    async fn check_status(&self) -> Result<StatusPayload, ApiError>;
}

/// `SegmentationApi` over HTTP using reqwest
pub struct HttpSegmentationClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSegmentationClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(ApiError::Status(resp.status().as_u16()));
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

#[async_trait]
impl SegmentationApi for HttpSegmentationClient {
    async fn start_job(&self) -> Result<(), ApiError> {
        self.get(SEGMENT_PATH).await?;
        Ok(())
    }

    async fn check_status(&self) -> Result<StatusPayload, ApiError> {
        let body = self.get(STATUS_PATH).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl<A: SegmentationApi + ?Sized> SegmentationApi for Arc<A> {
    async fn start_job(&self) -> Result<(), ApiError> {
        (**self).start_job().await
    }

    async fn check_status(&self) -> Result<StatusPayload, ApiError> {
        (**self).check_status().await
    }
}
