//! Sequences session, design, job and search into one observable state.
//!
//! Presentation code only sees [`WorkflowState`]: `Idle`, `Loading`,
//! `Results` or `Error`. Each `submit` is a run with its own generation and
//! [`CancelToken`]. Starting a run cancels the previous one, and a superseded
//! run can never publish state.

use crate::backend::{ApiError, DesignBackend};
use crate::cancel::CancelToken;
use crate::design::{DesignDraft, DesignSubmitter};
use crate::error::WorkflowError;
use crate::history::HistoryClient;
use crate::poller::{JobFailure, JobOutcome, JobPoller, JobSnapshot, Phase, PollConfig};
use crate::search::{SearchClient, SearchOptions};
use crate::session::SessionManager;
use serde::Serialize;
use sketchseek_common::protocol::{DesignId, HistoryItem, SearchResultItem, SessionId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingStage {
    Session,
    Design,
    Processing,
    Search,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadingView {
    pub stage: LoadingStage,
    /// Present once the first job poll has come back.
    pub job: Option<JobSnapshot>,
}

impl LoadingView {
    pub fn new(stage: LoadingStage) -> Self {
        Self { stage, job: None }
    }

    pub fn progress(&self) -> f64 {
        self.job.as_ref().map_or(0.0, |j| j.progress)
    }

    pub fn percent(&self) -> u32 {
        self.job.as_ref().map_or(0, JobSnapshot::percent)
    }

    pub fn phase(&self) -> Phase {
        Phase::from_progress(self.progress())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsView {
    pub design_id: DesignId,
    pub job: JobSnapshot,
    pub items: Vec<SearchResultItem>,
}

impl ResultsView {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Transport,
    JobFailed,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorView {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorView {
    fn job_failed(failure: &JobFailure) -> Self {
        Self {
            kind: ErrorKind::JobFailed,
            message: failure.error_code.clone(),
        }
    }
}

impl From<&WorkflowError> for ErrorView {
    fn from(error: &WorkflowError) -> Self {
        let kind = match error {
            WorkflowError::Validation(_) => ErrorKind::Validation,
            WorkflowError::Transport(_) | WorkflowError::Cancelled => ErrorKind::Transport,
            WorkflowError::PollingTimeout { .. } => ErrorKind::Timeout,
        };
        Self {
            kind,
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    Loading(LoadingView),
    Results(ResultsView),
    Error(ErrorView),
}

impl WorkflowState {
    pub fn is_loading(&self) -> bool {
        matches!(self, WorkflowState::Loading(_))
    }
}

/// Why a run stopped before producing results.
enum Halt {
    Failed(ErrorView),
    Cancelled,
}

impl From<WorkflowError> for Halt {
    fn from(error: WorkflowError) -> Self {
        match error {
            WorkflowError::Cancelled => Halt::Cancelled,
            other => Halt::Failed(ErrorView::from(&other)),
        }
    }
}

impl From<ApiError> for Halt {
    fn from(error: ApiError) -> Self {
        WorkflowError::from(error).into()
    }
}

fn ensure_active(cancel: &CancelToken) -> Result<(), Halt> {
    if cancel.is_cancelled() {
        Err(Halt::Cancelled)
    } else {
        Ok(())
    }
}

struct ActiveRun {
    generation: u64,
    cancel: CancelToken,
}

pub struct WorkflowController {
    session: SessionManager,
    designs: DesignSubmitter,
    poller: JobPoller,
    search: SearchClient,
    history: HistoryClient,
    options: SearchOptions,
    state: watch::Sender<WorkflowState>,
    active: Mutex<ActiveRun>,
}

impl WorkflowController {
    pub fn new(backend: Arc<dyn DesignBackend>, poll: PollConfig, options: SearchOptions) -> Self {
        let (state, _) = watch::channel(WorkflowState::Idle);
        Self {
            session: SessionManager::new(backend.clone()),
            designs: DesignSubmitter::new(backend.clone()),
            poller: JobPoller::new(backend.clone(), poll),
            search: SearchClient::new(backend.clone()),
            history: HistoryClient::new(backend),
            options,
            state,
            active: Mutex::new(ActiveRun {
                generation: 0,
                cancel: CancelToken::new(),
            }),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state.borrow().clone()
    }

    /// Receive every state transition.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state.subscribe()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.current()
    }

    pub fn search_options(&self) -> &SearchOptions {
        &self.options
    }

    /// Run the whole workflow for one design.
    ///
    /// Invalid input or an empty provider list goes straight to `Error`
    /// without a remote call. Any run
    /// still in flight is cancelled first. Returns this run's final state, or
    /// the current state if a later `submit` superseded it.
    pub async fn submit(&self, draft: DesignDraft) -> WorkflowState {
        let checked = draft
            .validate()
            .and_then(|()| self.options.normalized_providers().map(drop));
        if let Err(e) = checked {
            let view = ErrorView::from(&WorkflowError::from(e));
            warn!("Rejected design input: {}", view.message);
            self.begin_run(WorkflowState::Error(view));
            return self.state();
        }

        let (generation, cancel) =
            self.begin_run(WorkflowState::Loading(LoadingView::new(LoadingStage::Session)));
        info!(
            "Workflow run {} started ({} input)",
            generation, draft.input_mode
        );

        match self.run(generation, &cancel, &draft).await {
            Ok(results) => {
                info!(
                    "Workflow run {} finished with {} results",
                    generation,
                    results.items.len()
                );
                self.publish(generation, WorkflowState::Results(results));
            }
            Err(Halt::Failed(view)) => {
                warn!("Workflow run {} failed: {}", generation, view.message);
                self.publish(generation, WorkflowState::Error(view));
            }
            Err(Halt::Cancelled) => {
                info!("Workflow run {} superseded", generation);
            }
        }

        self.state()
    }

    /// `Error -> Idle`. No-op in any other state.
    pub fn dismiss(&self) -> bool {
        let _active = self.lock_active();
        self.state.send_if_modified(|state| {
            if matches!(state, WorkflowState::Error(_)) {
                *state = WorkflowState::Idle;
                true
            } else {
                false
            }
        })
    }

    /// History for the current session. Empty when no session exists yet or
    /// the backend cannot serve it.
    pub async fn history(&self) -> Vec<HistoryItem> {
        match self.session.current() {
            Some(session_id) => self.history.fetch_history(&session_id).await,
            None => Vec::new(),
        }
    }

    async fn run(
        &self,
        generation: u64,
        cancel: &CancelToken,
        draft: &DesignDraft,
    ) -> Result<ResultsView, Halt> {
        let session_id = self.session.ensure_session().await?;
        ensure_active(cancel)?;

        self.publish(
            generation,
            WorkflowState::Loading(LoadingView::new(LoadingStage::Design)),
        );
        let design_id = self.designs.submit(&session_id, draft).await?;
        ensure_active(cancel)?;

        self.publish(
            generation,
            WorkflowState::Loading(LoadingView::new(LoadingStage::Processing)),
        );
        let job_id = self.poller.start(&design_id).await?;
        ensure_active(cancel)?;

        let outcome = self
            .poller
            .await_completion(&job_id, cancel, |snapshot| {
                self.publish(
                    generation,
                    WorkflowState::Loading(LoadingView {
                        stage: LoadingStage::Processing,
                        job: Some(snapshot.clone()),
                    }),
                );
            })
            .await?;

        let job = match outcome {
            JobOutcome::Done(job) => job,
            JobOutcome::Failed(failure) => {
                return Err(Halt::Failed(ErrorView::job_failed(&failure)));
            }
        };
        ensure_active(cancel)?;

        self.publish(
            generation,
            WorkflowState::Loading(LoadingView {
                stage: LoadingStage::Search,
                job: Some(job.clone()),
            }),
        );
        let items = self
            .search
            .search(&design_id, &self.options.providers, self.options.limit)
            .await?;
        ensure_active(cancel)?;

        Ok(ResultsView {
            design_id,
            job,
            items,
        })
    }

    /// Start a new generation: cancel whatever is running and publish the
    /// run's first state under the same lock.
    fn begin_run(&self, initial: WorkflowState) -> (u64, CancelToken) {
        let mut active = self.lock_active();
        active.cancel.cancel();
        active.generation += 1;
        active.cancel = CancelToken::new();
        self.state.send_replace(initial);
        (active.generation, active.cancel.clone())
    }

    /// Publish only if `generation` is still the current run.
    fn publish(&self, generation: u64, state: WorkflowState) -> bool {
        let active = self.lock_active();
        if active.generation != generation {
            return false;
        }
        self.state.send_replace(state);
        true
    }

    fn lock_active(&self) -> MutexGuard<'_, ActiveRun> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
