#![allow(dead_code)]

use async_trait::async_trait;
use sketchseek_engine::backend::{ApiError, DesignBackend};
use sketchseek_engine::poller::PollConfig;
use sketchseek_engine::protocol::{
    CreateDesignRequest, DesignId, DesignResponse, HistoryResponse, JobId, JobState, JobStatus,
    ProcessResponse, SearchRequest, SearchResponse, SearchResultItem, SessionId, SessionResponse,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// In-memory backend replaying scripted responses and recording every call.
pub struct ScriptedBackend {
    calls: Mutex<Vec<&'static str>>,
    design_requests: Mutex<Vec<CreateDesignRequest>>,
    search_requests: Mutex<Vec<SearchRequest>>,
    session_error: Mutex<Option<ApiError>>,
    design_error: Option<ApiError>,
    polls: Mutex<VecDeque<Result<JobStatus, ApiError>>>,
    /// Returned once `polls` runs dry.
    fallback_poll: JobStatus,
    poll_delay: Duration,
    search_result: Result<Vec<SearchResultItem>, ApiError>,
    history_result: Result<HistoryResponse, ApiError>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            design_requests: Mutex::new(Vec::new()),
            search_requests: Mutex::new(Vec::new()),
            session_error: Mutex::new(None),
            design_error: None,
            polls: Mutex::new(VecDeque::new()),
            fallback_poll: job(JobState::Running, 0.5),
            poll_delay: Duration::ZERO,
            search_result: Ok(Vec::new()),
            history_result: Err(ApiError::Request("connection refused".into())),
        }
    }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_polls(self, polls: Vec<Result<JobStatus, ApiError>>) -> Self {
        *self.polls.lock().unwrap() = polls.into();
        self
    }

    pub fn with_fallback_poll(mut self, status: JobStatus) -> Self {
        self.fallback_poll = status;
        self
    }

    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    pub fn with_search_results(mut self, results: Vec<SearchResultItem>) -> Self {
        self.search_result = Ok(results);
        self
    }

    pub fn with_search_error(mut self, error: ApiError) -> Self {
        self.search_result = Err(error);
        self
    }

    pub fn with_session_error(self, error: ApiError) -> Self {
        *self.session_error.lock().unwrap() = Some(error);
        self
    }

    pub fn with_design_error(mut self, error: ApiError) -> Self {
        self.design_error = Some(error);
        self
    }

    pub fn with_history(mut self, result: Result<HistoryResponse, ApiError>) -> Self {
        self.history_result = result;
        self
    }

    /// Let the next session creation succeed.
    pub fn clear_session_error(&self) {
        *self.session_error.lock().unwrap() = None;
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn design_requests(&self) -> Vec<CreateDesignRequest> {
        self.design_requests.lock().unwrap().clone()
    }

    pub fn search_requests(&self) -> Vec<SearchRequest> {
        self.search_requests.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DesignBackend for ScriptedBackend {
    async fn create_session(&self) -> Result<SessionResponse, ApiError> {
        self.record("create_session");
        if let Some(error) = self.session_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(SessionResponse {
            session_id: SessionId::new("s-1"),
        })
    }

    async fn create_design(
        &self,
        request: &CreateDesignRequest,
    ) -> Result<DesignResponse, ApiError> {
        self.record("create_design");
        self.design_requests.lock().unwrap().push(request.clone());
        if let Some(error) = &self.design_error {
            return Err(error.clone());
        }
        Ok(DesignResponse {
            design_id: DesignId::new("d-1"),
            status: "created".into(),
        })
    }

    async fn start_processing(&self, _design_id: &DesignId) -> Result<ProcessResponse, ApiError> {
        self.record("start_processing");
        Ok(ProcessResponse {
            job_id: JobId::new("j-1"),
            status: "queued".into(),
        })
    }

    async fn job_status(&self, _job_id: &JobId) -> Result<JobStatus, ApiError> {
        self.record("job_status");
        if !self.poll_delay.is_zero() {
            tokio::time::sleep(self.poll_delay).await;
        }
        let next = self.polls.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(self.fallback_poll.clone()))
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> {
        self.record("search");
        self.search_requests.lock().unwrap().push(request.clone());
        self.search_result
            .clone()
            .map(|results| SearchResponse { results })
    }

    async fn history(&self, _session_id: &SessionId) -> Result<HistoryResponse, ApiError> {
        self.record("history");
        self.history_result.clone()
    }
}

pub fn job(status: JobState, progress: f64) -> JobStatus {
    JobStatus {
        job_id: JobId::new("j-1"),
        status,
        progress,
        error_code: None,
        ai_image_url: None,
        keywords: None,
        dominant_color: None,
    }
}

pub fn result_item(title: &str, overall: f64) -> SearchResultItem {
    SearchResultItem {
        title: title.to_string(),
        image_url: Some(format!("https://img.example/{}.png", title)),
        product_url: Some(format!("https://shop.example/{}", title)),
        price: None,
        overall,
        keyword: overall,
        color: overall,
        embedding: overall,
        explanation: vec![format!("matches {}", title)],
    }
}

/// Millisecond cadence so tests stay fast.
pub fn fast_polling(max_attempts: u32) -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(1),
        max_attempts,
    }
}
