use async_trait::async_trait;
pub use sketchseek_common::error::ApiError;
use sketchseek_common::protocol::{
    CreateDesignRequest, DesignId, DesignResponse, HistoryResponse, JobId, JobStatus,
    ProcessResponse, SearchRequest, SearchResponse, SessionId, SessionResponse,
};

/// The DesignBackend trait is the remote contract every workflow stage talks to.
///
/// One method per endpoint. Implementations must not retry; retry and timeout
/// policy lives in the callers (only the job poller has one).
#[async_trait]
pub trait DesignBackend: Send + Sync {
    /// `POST /api/sessions`
    async fn create_session(&self) -> Result<SessionResponse, ApiError>;

    /// `POST /api/designs`
    async fn create_design(
        &self,
        request: &CreateDesignRequest,
    ) -> Result<DesignResponse, ApiError>;

    /// `POST /api/designs/{design_id}/process`
    async fn start_processing(&self, design_id: &DesignId) -> Result<ProcessResponse, ApiError>;

    /// `GET /api/jobs/{job_id}`
    async fn job_status(&self, job_id: &JobId) -> Result<JobStatus, ApiError>;

    /// `POST /api/search`
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError>;

    /// `GET /api/sessions/{session_id}/history`
    async fn history(&self, session_id: &SessionId) -> Result<HistoryResponse, ApiError>;
}
