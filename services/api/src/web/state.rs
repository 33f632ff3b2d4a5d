//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use menu_finder_core::ports::{RecommendationProvider, SpeechToTextService};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sst_adapter: Arc<dyn SpeechToTextService>,
    /// `None` when no usable API key is configured (mock mode).
    pub search_adapter: Option<Arc<dyn RecommendationProvider>>,
}

impl AppState {
    /// The caller's location, or the configured default when none was sent.
    pub fn location_or_default(&self, location: Option<String>) -> String {
        location.unwrap_or_else(|| self.config.default_location.clone())
    }
}
