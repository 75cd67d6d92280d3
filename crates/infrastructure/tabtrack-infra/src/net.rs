use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use serde_json::json;
use tabtrack_config::{EVENTS_PATH, JSON_CONTENT_TYPE, VALIDATE_PATH};
use tabtrack_core::EventBatch;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("invalid collector url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("collector request failed: {0}")]
    Request(String),
    #[error("collector responded with status {0}")]
    Status(u16),
    #[error("could not encode request body: {0}")]
    Encode(String),
}

/// Remote side of the pipeline. Only success or failure of a request matters.
#[async_trait::async_trait]
pub trait Collector: Send + Sync {
    async fn post_batch(&self, batch: &EventBatch) -> Result<(), TransportError>;

    /// `Ok(false)` when the collector rejects the deployment id.
    async fn validate_deployment(&self, deployment_id: &str) -> Result<bool, TransportError>;
}

/// Posts JSON to `<base>/tableau-events` and `<base>/validate`.
pub struct HttpCollector {
    client: Client,
    base: Url,
}

impl HttpCollector {
    /// `base` must end in `/`; see [`crate::resolve_collector_base`].
    pub fn new(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base.join(path).map_err(|e| TransportError::InvalidUrl {
            url: format!("{}{}", self.base, path),
            message: e.to_string(),
        })
    }

    async fn post_json(&self, url: Url, body: Vec<u8>) -> Result<StatusCode, TransportError> {
        let resp = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(resp.status())
    }
}

#[async_trait::async_trait]
impl Collector for HttpCollector {
    async fn post_batch(&self, batch: &EventBatch) -> Result<(), TransportError> {
        let url = self.endpoint(EVENTS_PATH)?;
        let body = serde_json::to_vec(batch).map_err(|e| TransportError::Encode(e.to_string()))?;
        let status = self.post_json(url, body).await?;
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        debug!("Delivered batch of {}", batch.events.len());
        Ok(())
    }

    async fn validate_deployment(&self, deployment_id: &str) -> Result<bool, TransportError> {
        let url = self.endpoint(VALIDATE_PATH)?;
        let body = serde_json::to_vec(&json!({ "deploymentId": deployment_id }))
            .map_err(|e| TransportError::Encode(e.to_string()))?;
        let status = self.post_json(url, body).await?;
        if status.is_success() {
            Ok(true)
        } else if status.is_client_error() {
            Ok(false)
        } else {
            Err(TransportError::Status(status.as_u16()))
        }
    }
}
