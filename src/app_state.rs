use std::sync::Arc;

use crate::services::workflow::WorkflowLauncher;
use crate::store::JobStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub workflow: Arc<dyn WorkflowLauncher>,
}

impl AppState {
    pub fn new(
        store: impl JobStore + 'static,
        workflow: impl WorkflowLauncher + 'static,
    ) -> Self {
        Self {
            store: Arc::new(store),
            workflow: Arc::new(workflow),
        }
    }

    /// Build state around already shared components.
    pub fn from_shared(store: Arc<dyn JobStore>, workflow: Arc<dyn WorkflowLauncher>) -> Self {
        Self { store, workflow }
    }
}
