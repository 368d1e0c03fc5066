use crate::backend::{ApiError, DesignBackend};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sketchseek_common::protocol::{
    CreateDesignRequest, DesignId, DesignResponse, HistoryResponse, JobId, JobStatus,
    ProcessResponse, SearchRequest, SearchResponse, SessionId, SessionResponse,
};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Base URL used when neither config nor environment provide one.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// JSON-over-HTTP implementation of [`DesignBackend`].
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, None)
    }

    /// Create a backend whose requests give up after `timeout`.
    /// `None` leaves requests unbounded.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))?;
        Self::with_client(client, base_url)
    }

    /// Use a preconfigured client (proxy, TLS, headers).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL. Each segment is percent-encoded,
    /// so opaque ids cannot change the route.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            debug!("Backend responded {}: {}", status, text);
            return Err(ApiError::from_response(status.as_u16(), &text));
        }

        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DesignBackend for HttpBackend {
    async fn create_session(&self) -> Result<SessionResponse, ApiError> {
        let url = self.endpoint(&["api", "sessions"])?;
        self.send(self.client.post(url)).await
    }

    async fn create_design(
        &self,
        request: &CreateDesignRequest,
    ) -> Result<DesignResponse, ApiError> {
        let url = self.endpoint(&["api", "designs"])?;
        self.send(self.client.post(url).json(request)).await
    }

    async fn start_processing(&self, design_id: &DesignId) -> Result<ProcessResponse, ApiError> {
        let url = self.endpoint(&["api", "designs", design_id.as_str(), "process"])?;
        self.send(self.client.post(url)).await
    }

    async fn job_status(&self, job_id: &JobId) -> Result<JobStatus, ApiError> {
        let url = self.endpoint(&["api", "jobs", job_id.as_str()])?;
        self.send(self.client.get(url)).await
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> {
        let url = self.endpoint(&["api", "search"])?;
        self.send(self.client.post(url).json(request)).await
    }

    async fn history(&self, session_id: &SessionId) -> Result<HistoryResponse, ApiError> {
        let url = self.endpoint(&["api", "sessions", session_id.as_str(), "history"])?;
        self.send(self.client.get(url)).await
    }
}
