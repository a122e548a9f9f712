use std::sync::Arc;

use crate::config::Config;
use crate::store::DocumentStore;
use crate::visitor::VisitorCounter;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Process-wide document store, created once at startup.
    pub store: Arc<dyn DocumentStore>,
    pub visitors: VisitorCounter,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: Config) -> Self {
        Self {
            visitors: VisitorCounter::new(store.clone()),
            store,
            config,
        }
    }
}
