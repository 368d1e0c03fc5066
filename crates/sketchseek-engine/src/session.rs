use crate::backend::{ApiError, DesignBackend};
use sketchseek_common::protocol::SessionId;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Obtains and caches the session id for the lifetime of the client.
pub struct SessionManager {
    backend: Arc<dyn DesignBackend>,
    session: OnceCell<SessionId>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn DesignBackend>) -> Self {
        Self {
            backend,
            session: OnceCell::new(),
        }
    }

    /// Return the cached session, creating it on first use.
    ///
    /// At most one creation call succeeds per manager; concurrent callers
    /// wait on the same initialisation. A failed creation is not cached, so
    /// the next call tries again.
    pub async fn ensure_session(&self) -> Result<SessionId, ApiError> {
        self.session
            .get_or_try_init(|| async {
                let response = self.backend.create_session().await?;
                info!("Created session {}", response.session_id);
                Ok::<_, ApiError>(response.session_id)
            })
            .await
            .cloned()
    }

    /// The cached session, if one has been created.
    pub fn current(&self) -> Option<SessionId> {
        self.session.get().cloned()
    }
}
