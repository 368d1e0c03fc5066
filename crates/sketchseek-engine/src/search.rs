use crate::backend::DesignBackend;
use crate::error::{ValidationError, WorkflowError};
use sketchseek_common::protocol::{DesignId, SearchRequest, SearchResultItem};
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_PROVIDERS: &[&str] = &["mock", "api"];
pub const DEFAULT_LIMIT: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub providers: Vec<String>,
    pub limit: u32,
}

impl SearchOptions {
    /// Provider ids trimmed, blanks dropped. Empty is rejected.
    pub fn normalized_providers(&self) -> Result<Vec<String>, ValidationError> {
        normalize_providers(&self.providers)
    }
}

fn normalize_providers(providers: &[String]) -> Result<Vec<String>, ValidationError> {
    let providers: Vec<String> = providers
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if providers.is_empty() {
        return Err(ValidationError::NoProviders);
    }
    Ok(providers)
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            providers: DEFAULT_PROVIDERS.iter().map(|p| p.to_string()).collect(),
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Requests ranked results for a processed design.
pub struct SearchClient {
    backend: Arc<dyn DesignBackend>,
}

impl SearchClient {
    pub fn new(backend: Arc<dyn DesignBackend>) -> Self {
        Self { backend }
    }

    /// Results come back in backend rank order and are not re-sorted.
    /// An empty list is a valid outcome.
    pub async fn search(
        &self,
        design_id: &DesignId,
        providers: &[String],
        limit: u32,
    ) -> Result<Vec<SearchResultItem>, WorkflowError> {
        let providers = normalize_providers(providers)?;

        let request = SearchRequest {
            design_id: design_id.clone(),
            providers: Some(providers),
            limit: Some(limit),
        };
        let response = self.backend.search(&request).await?;
        info!(
            "Search for design {} returned {} results",
            design_id,
            response.results.len()
        );
        Ok(response.results)
    }
}
