//! Application state shared with the HTTP handlers.

use prometheus::Registry;
use std::sync::Arc;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// State handed to every request.
///
/// The registry is written by the fetch loop and only read here; a scrape
/// never triggers upstream calls.
pub struct AppState {
    pub registry: Registry,
}

impl AppState {
    pub fn new(registry: Registry) -> SharedState {
        Arc::new(Self { registry })
    }
}
