use crate::backend::DesignBackend;
use sketchseek_common::protocol::{HistoryItem, SessionId};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fetches past designs for a session. Never fails: history is supplementary.
pub struct HistoryClient {
    backend: Arc<dyn DesignBackend>,
}

impl HistoryClient {
    pub fn new(backend: Arc<dyn DesignBackend>) -> Self {
        Self { backend }
    }

    /// Any error degrades to an empty list.
    pub async fn fetch_history(&self, session_id: &SessionId) -> Vec<HistoryItem> {
        match self.backend.history(session_id).await {
            Ok(response) => {
                debug!(
                    "Fetched {} of {} history items for session {}",
                    response.items.len(),
                    response.total,
                    session_id
                );
                response.items
            }
            Err(e) => {
                warn!("History unavailable for session {}: {}", session_id, e);
                Vec::new()
            }
        }
    }
}
