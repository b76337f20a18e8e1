//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the instrument store behind a trait object so the binary can run on
//! Postgres while route tests run on the in-memory store.

use std::sync::Arc;

use crate::db::InstrumentStore;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn InstrumentStore>,
    /// Recorded on every typed upload.
    pub schema_version: Arc<str>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn InstrumentStore>, schema_version: &str) -> Self {
        Self { store, schema_version: Arc::from(schema_version) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
