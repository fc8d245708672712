//! Application state shared across Axum route handlers.

use chrono::{DateTime, Utc};
use services::EvaluationService;
use std::sync::Arc;

/// Central application state: the evaluation lifecycle service plus
/// process metadata for the health endpoint. Cloned into every handler via
/// Axum's `State<T>` extractor.
#[derive(Clone)]
pub struct AppState {
    service: Arc<EvaluationService>,
    started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: Arc<EvaluationService>) -> Self {
        Self {
            service,
            started_at: Utc::now(),
        }
    }

    pub fn service(&self) -> &Arc<EvaluationService> {
        &self.service
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}
