pub mod api;
pub mod browser;
pub mod config;
pub mod detect;
pub mod error;
pub mod gate;

use std::sync::Arc;
use config::Config;
use gate::ResourceGate;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gate: Arc<ResourceGate>,
}
