pub mod api;
pub mod cli;
pub mod config;
pub mod deploy;
pub mod error;
pub mod generator;
pub mod ir;

use config::Config;
use std::sync::Arc;

use crate::deploy::{DeploymentOrchestrator, PlatformRegistry};

pub struct AppState {
    pub config: Config,
    pub orchestrator: Arc<DeploymentOrchestrator>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let orchestrator = Arc::new(DeploymentOrchestrator::new(
            PlatformRegistry::with_defaults(),
            config.deploy.clone(),
        ));
        Self { config, orchestrator }
    }
}
