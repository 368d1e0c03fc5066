//! Drives a backend processing job to a terminal state.
//!
//! The backend reports progress asynchronously; [`JobPoller`] turns that into a
//! single awaited result by querying job status on a fixed cadence with a
//! bounded attempt budget. Each successful query is merged into a
//! [`JobSnapshot`] and handed to the caller, so partial fields such as the AI
//! reference image are visible as soon as the backend fills them in.

use crate::backend::DesignBackend;
use crate::cancel::CancelToken;
use crate::error::WorkflowError;
use serde::Serialize;
use sketchseek_common::protocol::{DesignId, JobId, JobState, JobStatus};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Reported when a job fails without an error code.
pub const GENERIC_FAILURE_CODE: &str = "Processing failed";

/// Display phase derived from a progress value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Analyzing,
    GeneratingReference,
    Searching,
}

impl Phase {
    /// Pure function of the current value; earlier polls play no part.
    /// NaN and negative values read as the first phase.
    pub fn from_progress(progress: f64) -> Self {
        if progress.is_nan() || progress < 0.4 {
            Phase::Analyzing
        } else if progress < 0.7 {
            Phase::GeneratingReference
        } else {
            Phase::Searching
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Analyzing => "analyzing",
            Phase::GeneratingReference => "generating reference",
            Phase::Searching => "searching",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Latest known state of a job, accumulated across polls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub status: JobState,
    pub progress: f64,
    pub error_code: Option<String>,
    pub ai_image_url: Option<String>,
    pub keywords: Vec<String>,
    pub dominant_color: Option<String>,
    /// Successful status queries merged so far.
    pub polls: u32,
}

impl JobSnapshot {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            status: JobState::Queued,
            progress: 0.0,
            error_code: None,
            ai_image_url: None,
            keywords: Vec::new(),
            dominant_color: None,
            polls: 0,
        }
    }

    /// Fold one poll response in. Status and progress always take the latest
    /// value; optional fields only ever get filled, never cleared.
    pub fn merge(&mut self, status: JobStatus) {
        self.status = status.status;
        self.progress = status.progress;
        self.polls += 1;

        if let Some(code) = status.error_code {
            self.error_code = Some(code);
        }
        if let Some(url) = status.ai_image_url {
            self.ai_image_url = Some(url);
        }
        if let Some(keywords) = status.keywords {
            self.keywords = keywords;
        }
        if let Some(color) = status.dominant_color {
            self.dominant_color = Some(color);
        }
    }

    pub fn phase(&self) -> Phase {
        Phase::from_progress(self.progress)
    }

    /// Progress as a whole percentage, clamped to 0..=100.
    pub fn percent(&self) -> u32 {
        if self.progress.is_nan() {
            return 0;
        }
        (self.progress.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

/// Backend-reported failure. A business outcome, not a transport fault.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFailure {
    pub error_code: String,
    pub job: JobSnapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Done(JobSnapshot),
    Failed(JobFailure),
}

impl JobOutcome {
    fn from_terminal(job: JobSnapshot) -> Self {
        match job.status {
            JobState::Failed => JobOutcome::Failed(JobFailure {
                error_code: job
                    .error_code
                    .clone()
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| GENERIC_FAILURE_CODE.to_string()),
                job,
            }),
            _ => JobOutcome::Done(job),
        }
    }
}

pub struct JobPoller {
    backend: Arc<dyn DesignBackend>,
    config: PollConfig,
}

impl JobPoller {
    /// A zero attempt budget is raised to one so the job is queried at least once.
    pub fn new(backend: Arc<dyn DesignBackend>, mut config: PollConfig) -> Self {
        config.max_attempts = config.max_attempts.max(1);
        Self { backend, config }
    }

    pub fn config(&self) -> PollConfig {
        self.config
    }

    /// Kick off processing for a design.
    pub async fn start(&self, design_id: &DesignId) -> Result<JobId, WorkflowError> {
        let response = self.backend.start_processing(design_id).await?;
        info!(
            "Started job {} for design {} (status: {})",
            response.job_id, design_id, response.status
        );
        Ok(response.job_id)
    }

    /// Poll until the job reaches `done` or `failed`.
    ///
    /// `on_progress` sees the merged snapshot after every successful query,
    /// terminal ones included. A failed query is logged and still consumes an
    /// attempt. Exhausting the budget yields [`WorkflowError::PollingTimeout`];
    /// cancelling `cancel` stops polling at the next query or mid-sleep.
    pub async fn await_completion<F>(
        &self,
        job_id: &JobId,
        cancel: &CancelToken,
        mut on_progress: F,
    ) -> Result<JobOutcome, WorkflowError>
    where
        F: FnMut(&JobSnapshot),
    {
        let max_attempts = self.config.max_attempts;
        let mut snapshot = JobSnapshot::new(job_id.clone());
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return Err(WorkflowError::Cancelled);
            }

            let polled = tokio::select! {
                result = self.backend.job_status(job_id) => result,
                _ = cancel.cancelled() => return Err(WorkflowError::Cancelled),
            };

            match polled {
                Ok(status) => {
                    snapshot.merge(status);
                    debug!(
                        "Job {} poll {}/{}: {} at {:.2}",
                        job_id, attempt, max_attempts, snapshot.status, snapshot.progress
                    );
                    on_progress(&snapshot);

                    if snapshot.status.is_terminal() {
                        info!(
                            "Job {} finished as {} after {} polls",
                            job_id, snapshot.status, attempt
                        );
                        return Ok(JobOutcome::from_terminal(snapshot));
                    }
                }
                Err(e) => {
                    warn!(
                        "Job {} poll {}/{} failed: {}",
                        job_id, attempt, max_attempts, e
                    );
                    last_error = Some(e);
                }
            }

            if attempt < max_attempts {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.interval) => {}
                    _ = cancel.cancelled() => return Err(WorkflowError::Cancelled),
                }
            }
        }

        warn!("Job {} did not finish within {} polls", job_id, max_attempts);
        Err(WorkflowError::PollingTimeout {
            attempts: max_attempts,
            last_error,
        })
    }
}
