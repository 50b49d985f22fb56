use std::collections::HashMap;
use std::sync::Arc;

use super::platforms::{AwsAdapter, FlyAdapter, HerokuAdapter, RailwayAdapter, RenderAdapter, VercelAdapter};
use super::{Platform, PlatformAdapter};
use crate::error::DeployError;

/// Adapters keyed by platform.
#[derive(Clone, Default)]
pub struct PlatformRegistry {
    adapters: HashMap<Platform, Arc<dyn PlatformAdapter>>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in adapter.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(VercelAdapter));
        registry.register(Arc::new(RailwayAdapter));
        registry.register(Arc::new(RenderAdapter));
        registry.register(Arc::new(FlyAdapter));
        registry.register(Arc::new(HerokuAdapter));
        registry.register(Arc::new(AwsAdapter));
        registry
    }

    /// Replaces any adapter already registered for the same platform.
    pub fn register(&mut self, adapter: Arc<dyn PlatformAdapter>) {
        self.adapters.insert(adapter.platform(), adapter);
    }

    pub fn get(&self, platform: Platform) -> Result<Arc<dyn PlatformAdapter>, DeployError> {
        self.adapters
            .get(&platform)
            .cloned()
            .ok_or_else(|| DeployError::UnsupportedPlatform(platform.to_string()))
    }

    /// Registered adapters in declaration order of [`Platform::ALL`].
    pub fn list(&self) -> Vec<Arc<dyn PlatformAdapter>> {
        Platform::ALL
            .iter()
            .filter_map(|p| self.adapters.get(p).cloned())
            .collect()
    }
}
