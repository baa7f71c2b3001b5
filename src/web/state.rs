use std::sync::Arc;

use label_forge_config::AppConfig;

use super::pipeline::Pipeline;

/// Everything a request handler needs, built once at startup.
pub struct AppState {
    pub config: AppConfig,
    pub pipeline: Pipeline,
}

/// Shared state type for passing across async boundaries
pub type SharedState = Arc<AppState>;
