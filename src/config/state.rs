// Application state module
// Everything a connection task needs, built once at startup

use std::sync::Arc;

use super::types::{AppConfig, Config};
use crate::routing::Router;

/// Application state
///
/// Immutable after startup and shared by every connection through `Arc`.
pub struct AppState {
    pub config: Config,
    /// Snapshot handed to each request context
    pub app_config: Arc<AppConfig>,
    pub router: Router,
}

impl AppState {
    pub fn new(config: Config, router: Router) -> Self {
        let app_config = Arc::new(config.app.clone());
        Self {
            config,
            app_config,
            router,
        }
    }
}
