use std::sync::Arc;

use crate::plan::relay::PlanRelay;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<PlanRelay>,
}
