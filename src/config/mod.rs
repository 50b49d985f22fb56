use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::ir::GenerationOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
    /// Defaults applied when a request omits generation options
    #[serde(default)]
    pub generation: GenerationOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeployConfig {
    /// Multiplier applied to every simulated rollout step (0 runs steps back to back)
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
    /// Hard limit on a single rollout, in seconds
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
    /// Log entries kept per deployment; later appends are dropped
    #[serde(default = "default_max_log_entries")]
    pub max_log_entries: usize,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            time_scale: default_time_scale(),
            deadline_secs: default_deadline_secs(),
            max_log_entries: default_max_log_entries(),
        }
    }
}

fn default_time_scale() -> f64 {
    1.0
}

fn default_deadline_secs() -> u64 {
    600
}

fn default_max_log_entries() -> usize {
    1000
}

impl DeployConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    /// `duration` scaled by `time_scale`; non-finite or negative scales collapse to zero.
    pub fn scaled(&self, duration: Duration) -> Duration {
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(duration.as_secs_f64() * self.time_scale).unwrap_or(Duration::MAX)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            deploy: DeployConfig::default(),
            generation: GenerationOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{DatabaseKind, Framework};
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load(Path::new("/nonexistent/stackforge.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.deploy.deadline_secs, 600);
        assert_eq!(config.deploy.max_log_entries, 1000);
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9000\n\n[deploy]\ntime_scale = 0.01\n\n[generation]\nframework = \"fastify\"\ndatabase = \"mysql\""
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.deploy.time_scale, 0.01);
        assert_eq!(config.deploy.deadline_secs, 600);
        assert_eq!(config.generation.framework, Framework::Fastify);
        assert_eq!(config.generation.database, DatabaseKind::Mysql);
        assert!(config.generation.include_tests);
    }

    #[test]
    fn test_scaled_durations() {
        let mut deploy = DeployConfig::default();
        assert_eq!(deploy.scaled(Duration::from_millis(500)), Duration::from_millis(500));
        deploy.time_scale = 0.5;
        assert_eq!(deploy.scaled(Duration::from_secs(2)), Duration::from_secs(1));
        deploy.time_scale = -1.0;
        assert_eq!(deploy.scaled(Duration::from_secs(2)), Duration::ZERO);
        deploy.time_scale = f64::NAN;
        assert_eq!(deploy.scaled(Duration::from_secs(2)), Duration::ZERO);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        assert!(Config::load(file.path()).is_err());
    }
}
