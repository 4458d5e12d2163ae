//! Shared state handed to every handler.

use std::sync::Arc;

use crate::core_state::CoreState;

/// Cloned into each request by axum's `State` extractor.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}
