//! Shared application state.

use std::sync::Arc;

use flightctl_store::Store;

/// State available to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// The resource store.
    pub store: Arc<Store>,
}

impl AppState {
    /// Create the state over a store.
    #[must_use]
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}
