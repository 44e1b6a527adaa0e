//! Search orchestrator: owns the criteria, drives the request
//! lifecycle, and holds the rendered result set.

use std::sync::{Arc, RwLock};

use uuid::Uuid;

use dealscout_core::error::Result;
use dealscout_core::search::prompt::build_target_prompt;
use dealscout_core::search::service::CHAT_REQUEST_KIND;
use dealscout_core::search::{
    CompanyCandidate, GenerativePayload, GenerativeService, SearchCriteria, SearchField,
    SearchLifecycle,
};

/// Owns [`SearchCriteria`] and [`SearchLifecycle`], and talks to the
/// generative service.
///
/// At most one search is in flight at a time; a submit while in flight
/// is a no-op. Every submit leaves the in-flight state again, whatever
/// the outcome.
pub struct SearchOrchestrator {
    service: Arc<dyn GenerativeService>,
    criteria: RwLock<SearchCriteria>,
    lifecycle: RwLock<SearchLifecycle>,
}

impl SearchOrchestrator {
    pub fn new(service: Arc<dyn GenerativeService>) -> Self {
        Self {
            service,
            criteria: RwLock::new(SearchCriteria::default()),
            lifecycle: RwLock::new(SearchLifecycle::Idle),
        }
    }

    /// Assigns one criteria field. No validation, no side effects; the
    /// empty string unsets the field.
    pub fn update_field(&self, field: SearchField, value: impl Into<String>) {
        self.criteria.write().unwrap().set(field, value);
    }

    /// Snapshot of the current criteria.
    pub fn criteria(&self) -> SearchCriteria {
        self.criteria.read().unwrap().clone()
    }

    /// Snapshot of the current lifecycle state.
    pub fn lifecycle(&self) -> SearchLifecycle {
        self.lifecycle.read().unwrap().clone()
    }

    /// The candidates to render. Empty unless the last search resolved.
    pub fn results(&self) -> Vec<CompanyCandidate> {
        self.lifecycle.read().unwrap().results().to_vec()
    }

    /// Builds the prompt from the current criteria, dispatches it, and
    /// applies the terminal transition.
    ///
    /// There are no preconditions: all fields may be empty. Failures are
    /// absorbed into the `Failed` state with a diagnostic; nothing
    /// escapes to the caller.
    pub async fn submit_search(&self) {
        {
            // Check-and-set under one lock acquisition: at most one
            // in-flight search at a time.
            let mut lifecycle = self.lifecycle.write().unwrap();
            if lifecycle.is_in_flight() {
                tracing::debug!("search already in flight; ignoring submit");
                return;
            }
            // Entering InFlight discards any prior results, so stale
            // data never coexists with a pending request.
            *lifecycle = SearchLifecycle::InFlight;
        }

        let criteria = self.criteria.read().unwrap().clone();
        let search_id = Uuid::new_v4();
        tracing::info!(%search_id, "dispatching target-company search");

        let next = match self.dispatch(&criteria).await {
            Ok(results) => {
                tracing::info!(%search_id, count = results.len(), "search resolved");
                SearchLifecycle::Resolved { results }
            }
            Err(err) => {
                tracing::error!(%search_id, error = %err, "error fetching companies");
                SearchLifecycle::Failed
            }
        };

        *self.lifecycle.write().unwrap() = next;
    }

    async fn dispatch(&self, criteria: &SearchCriteria) -> Result<Vec<CompanyCandidate>> {
        let prompt = build_target_prompt(criteria)?;
        let response = self
            .service
            .request(CHAT_REQUEST_KIND, GenerativePayload::json(prompt))
            .await?;
        CompanyCandidate::from_response(response)
    }
}
