//! The per-platform capability set and the pure helpers adapters share.

use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;

use super::{DeploymentOptions, Platform};
use crate::error::DeployError;
use crate::generator::naming;
use crate::generator::{IssueCode, ValidationResult};
use crate::ir::{AuthType, DatabaseKind, GeneratedFile, GeneratedProject, Language};

lazy_static! {
    static ref ENV_NAME_REGEX: Regex = Regex::new(r"^[A-Z_][A-Z0-9_]*$").unwrap();

    /// RFC 1123 hostname with at least two labels
    static ref DOMAIN_REGEX: Regex =
        Regex::new(r"^(?i:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)(?:\.(?i:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?))+$").unwrap();
}

pub const ENVIRONMENTS: &[&str] = &["production", "staging", "development", "preview"];

/// Variables every platform needs.
pub const COMMON_REQUIRED_ENV: &[&str] = &["DATABASE_URL"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloutStep {
    pub name: String,
    pub duration: Duration,
}

impl RolloutStep {
    pub fn new(name: impl Into<String>, millis: u64) -> Self {
        Self {
            name: name.into(),
            duration: Duration::from_millis(millis),
        }
    }
}

/// A deployment target.
///
/// Implementations only describe the platform; starting, tracking and
/// cancelling deployments is done uniformly by the orchestrator.
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    fn display_name(&self) -> &'static str;

    /// Platform-specific required variables, on top of [`COMMON_REQUIRED_ENV`].
    fn required_env(&self) -> &'static [&'static str] {
        &[]
    }

    fn optional_env(&self) -> &'static [&'static str];

    /// Supported regions; the first is the default.
    fn regions(&self) -> &'static [&'static str];

    fn validate_config(&self, options: &DeploymentOptions) -> ValidationResult {
        validate_common(self.required_env(), self.optional_env(), self.regions(), options)
    }

    fn generate_deployment_files(
        &self,
        project: &GeneratedProject,
        options: &DeploymentOptions,
    ) -> Result<Vec<GeneratedFile>, DeployError>;

    fn rollout_plan(&self, options: &DeploymentOptions) -> Vec<RolloutStep>;

    fn deployment_url(&self, project: &GeneratedProject, options: &DeploymentOptions, deployment_id: &str) -> String;

    fn default_region(&self) -> &'static str {
        self.regions().first().copied().unwrap_or("")
    }

    fn region(&self, options: &DeploymentOptions) -> String {
        options
            .region
            .clone()
            .unwrap_or_else(|| self.default_region().to_string())
    }
}

/// Env var, region, domain and environment checks shared by every adapter.
pub fn validate_common(
    required: &[&str],
    optional: &[&str],
    regions: &[&str],
    options: &DeploymentOptions,
) -> ValidationResult {
    let mut result = ValidationResult::new();
    let env = &options.environment_variables;

    for name in env.keys() {
        if !ENV_NAME_REGEX.is_match(name) {
            result.error(
                format!("environmentVariables.{}", name),
                format!("'{}' is not a valid environment variable name", name),
                IssueCode::InvalidEnvVarName,
            );
        }
    }

    for name in COMMON_REQUIRED_ENV.iter().chain(required) {
        if env.get(*name).map(|v| v.trim().is_empty()).unwrap_or(true) {
            result.error(
                format!("environmentVariables.{}", name),
                format!("{} is required", name),
                IssueCode::MissingEnvVar,
            );
        }
    }

    for name in ["JWT_SECRET"].iter().chain(optional) {
        if !env.contains_key(*name) {
            result.warning(
                format!("environmentVariables.{}", name),
                format!("{} is not set", name),
                IssueCode::OptionalEnvVarMissing,
            );
        }
    }

    if let Some(region) = &options.region {
        if !regions.contains(&region.as_str()) {
            result.error(
                "region",
                format!("Unknown region '{}'; expected one of: {}", region, regions.join(", ")),
                IssueCode::UnknownRegion,
            );
        }
    }

    if let Some(domain) = &options.custom_domain {
        if !is_valid_domain(domain) {
            result.error(
                "customDomain",
                format!("'{}' is not a valid hostname", domain),
                IssueCode::InvalidDomain,
            );
        }
    }

    if !ENVIRONMENTS.contains(&options.environment.as_str()) {
        result.error(
            "environment",
            format!(
                "Unknown environment '{}'; expected one of: {}",
                options.environment,
                ENVIRONMENTS.join(", ")
            ),
            IssueCode::InvalidEnvironment,
        );
    }

    result
}

pub fn is_valid_domain(domain: &str) -> bool {
    domain.len() <= 253 && DOMAIN_REGEX.is_match(domain)
}

/// DNS-safe application name derived from the project name.
pub fn app_slug(project: &GeneratedProject) -> String {
    let slug: String = naming::kebab(&project.name)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        format!("app-{}", &project.id[..project.id.len().min(8)])
    } else {
        slug
    }
}

/// First eight characters of a deployment id, used in generated hostnames.
pub fn short_id(deployment_id: &str) -> String {
    deployment_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect::<String>()
        .to_lowercase()
}

/// Custom domain when configured, else `fallback`.
pub fn public_url(options: &DeploymentOptions, fallback: String) -> String {
    match &options.custom_domain {
        Some(domain) => format!("https://{}", domain),
        None => fallback,
    }
}

pub fn is_typescript(project: &GeneratedProject) -> bool {
    project.generation_options.language == Language::Typescript
}

pub fn build_command(project: &GeneratedProject) -> Option<&'static str> {
    if is_typescript(project) {
        Some("npm ci && npm run build")
    } else {
        None
    }
}

pub fn install_command() -> &'static str {
    "npm ci"
}

pub fn start_command() -> &'static str {
    "npm start"
}

pub fn server_entry(project: &GeneratedProject) -> &'static str {
    if is_typescript(project) {
        "dist/server.js"
    } else {
        "src/server.js"
    }
}

pub fn database(project: &GeneratedProject) -> DatabaseKind {
    project.generation_options.database
}

pub fn uses_tokens(project: &GeneratedProject) -> bool {
    matches!(project.auth_config.auth_type, AuthType::Jwt | AuthType::Oauth)
}

pub fn uses_sessions(project: &GeneratedProject) -> bool {
    project.auth_config.auth_type == AuthType::Session
}

/// Multi-stage Node image; `extra` lines are inserted before `CMD`.
pub fn dockerfile(project: &GeneratedProject, extra: &[&str]) -> String {
    let mut lines = vec![
        "FROM node:20-alpine AS build".to_string(),
        "WORKDIR /app".to_string(),
        "COPY package*.json ./".to_string(),
        "RUN npm ci".to_string(),
        "COPY . .".to_string(),
    ];
    if is_typescript(project) {
        lines.push("RUN npm run build".to_string());
    }
    lines.push("RUN npm prune --omit=dev".to_string());
    lines.push(String::new());
    lines.push("FROM node:20-alpine".to_string());
    lines.push("WORKDIR /app".to_string());
    lines.push("ENV NODE_ENV=production".to_string());
    lines.push("ENV PORT=3000".to_string());
    lines.push("COPY --from=build /app/node_modules ./node_modules".to_string());
    lines.push("COPY --from=build /app/package.json ./package.json".to_string());
    if is_typescript(project) {
        lines.push("COPY --from=build /app/dist ./dist".to_string());
    } else {
        lines.push("COPY --from=build /app/src ./src".to_string());
    }
    lines.extend(extra.iter().map(|l| l.to_string()));
    lines.push("EXPOSE 3000".to_string());
    lines.push(format!("CMD [\"node\", \"{}\"]", server_entry(project)));
    lines.join("\n") + "\n"
}

pub fn dockerignore() -> String {
    ["node_modules", "dist", "coverage", "tests", ".env", ".git", "*.log"].join("\n") + "\n"
}

pub fn descriptor(path: &str, content: String, language: &str) -> GeneratedFile {
    GeneratedFile::new(path, content, crate::ir::ArtifactKind::Config).with_language(language)
}

pub fn to_yaml<T: serde::Serialize>(path: &str, value: &T) -> Result<String, DeployError> {
    serde_yaml::to_string(value).map_err(|e| DeployError::Descriptor(format!("{}: {}", path, e)))
}

pub fn to_toml<T: serde::Serialize>(path: &str, value: &T) -> Result<String, DeployError> {
    toml::to_string_pretty(value).map_err(|e| DeployError::Descriptor(format!("{}: {}", path, e)))
}

pub fn to_json<T: serde::Serialize>(path: &str, value: &T) -> Result<String, DeployError> {
    serde_json::to_string_pretty(value)
        .map(|s| s + "\n")
        .map_err(|e| DeployError::Descriptor(format!("{}: {}", path, e)))
}
