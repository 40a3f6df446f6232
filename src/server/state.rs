//! Application state for the booking HTTP server.

use crate::auth::SessionStore;
use crate::booking::BookingWorkflow;
use crate::config::BookingConfig;
use crate::stats::StatsAggregator;
use crate::storage::ObjectStorage;
use crate::store::CemeteryStore;
use axum::extract::FromRef;
use std::sync::Arc;

/// Shared state cloned (cheaply, via `Arc`) into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Booking workflow orchestrator and its resource managers.
    pub workflow: BookingWorkflow,

    /// Dashboard rollups and waqaf records.
    pub stats: StatsAggregator,

    /// Bearer-token resolution for the auth extractors.
    pub sessions: Arc<dyn SessionStore>,

    /// Receipt upload target.
    pub storage: Arc<dyn ObjectStorage>,
}

impl AppState {
    /// Wires the application state over a store and its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn CemeteryStore>,
        sessions: Arc<dyn SessionStore>,
        storage: Arc<dyn ObjectStorage>,
        booking: BookingConfig,
    ) -> Self {
        Self {
            workflow: BookingWorkflow::new(store.clone(), booking),
            stats: StatsAggregator::new(store),
            sessions,
            storage,
        }
    }
}

// Lets the auth extractors pull the session store out of the state.
impl FromRef<AppState> for Arc<dyn SessionStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.sessions.clone()
    }
}
