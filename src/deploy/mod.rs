//! Simulated deployment: platform adapters and the rollout orchestrator.
//!
//! Adapters are pure: they validate options, render descriptor files and
//! describe a rollout plan. The orchestrator owns every running deployment
//! and is the only place where state changes over time.

pub mod adapter;
pub mod orchestrator;
pub mod platforms;
pub mod registry;
pub mod status;

pub use adapter::{PlatformAdapter, RolloutStep};
pub use orchestrator::DeploymentOrchestrator;
pub use registry::PlatformRegistry;
pub use status::{DeploymentState, DeploymentStatus, LogEntry, LogLevel};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Vercel,
    Railway,
    Render,
    #[serde(alias = "flyio", alias = "fly.io")]
    Fly,
    Heroku,
    Aws,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::Vercel,
        Platform::Railway,
        Platform::Render,
        Platform::Fly,
        Platform::Heroku,
        Platform::Aws,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Vercel => "vercel",
            Platform::Railway => "railway",
            Platform::Render => "render",
            Platform::Fly => "fly",
            Platform::Heroku => "heroku",
            Platform::Aws => "aws",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = crate::error::DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vercel" => Ok(Platform::Vercel),
            "railway" => Ok(Platform::Railway),
            "render" => Ok(Platform::Render),
            "fly" | "flyio" | "fly.io" => Ok(Platform::Fly),
            "heroku" => Ok(Platform::Heroku),
            "aws" => Ok(Platform::Aws),
            _ => Err(crate::error::DeployError::UnsupportedPlatform(s.to_string())),
        }
    }
}

/// What the caller asks for when starting a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentOptions {
    pub platform: Platform,
    /// Platform region; the adapter's default region when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default, alias = "envVars")]
    pub environment_variables: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
}

fn default_environment() -> String {
    "production".to_string()
}

impl DeploymentOptions {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            region: None,
            environment: default_environment(),
            environment_variables: BTreeMap::new(),
            custom_domain: None,
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment_variables.insert(key.into(), value.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.custom_domain = Some(domain.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parsing() {
        assert_eq!("Vercel".parse::<Platform>().unwrap(), Platform::Vercel);
        assert_eq!("fly.io".parse::<Platform>().unwrap(), Platform::Fly);
        assert!("netlify".parse::<Platform>().is_err());
        let parsed: Platform = serde_json::from_str("\"aws\"").unwrap();
        assert_eq!(parsed, Platform::Aws);
    }

    #[test]
    fn test_options_defaults() {
        let options: DeploymentOptions = serde_json::from_str(r#"{"platform":"render"}"#).unwrap();
        assert_eq!(options.environment, "production");
        assert!(options.region.is_none());
        assert!(options.environment_variables.is_empty());
    }
}
