//! Generated output aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AuthConfig, Endpoint, GenerationOptions, Model};
use crate::deploy::Platform;
use crate::generator::docs::OpenApiDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Source,
    Config,
    Documentation,
    Test,
    Schema,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl GeneratedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            kind,
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Deployment staging attached to a generated project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    pub platform: Platform,
    pub region: String,
    pub environment: String,
    pub descriptor_files: Vec<String>,
}

/// Immutable snapshot produced by one generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedProject {
    pub id: String,
    pub name: String,
    pub models: Vec<Model>,
    pub endpoints: Vec<Endpoint>,
    pub auth_config: AuthConfig,
    pub files: Vec<GeneratedFile>,
    pub openapi: OpenApiDocument,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentConfig>,
    pub generation_options: GenerationOptions,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GeneratedProject {
    pub fn file(&self, path: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn paths(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.path.as_str()).collect()
    }

    /// Returns a new snapshot staged for `config`, appending the descriptor files.
    ///
    /// Descriptor paths replace any earlier staging so re-staging for another
    /// platform never leaves stale descriptors behind.
    pub fn with_deployment(&self, config: DeploymentConfig, descriptors: Vec<GeneratedFile>) -> Self {
        let previous: Vec<String> = self
            .deployment
            .as_ref()
            .map(|d| d.descriptor_files.clone())
            .unwrap_or_default();

        let mut files: Vec<GeneratedFile> = self
            .files
            .iter()
            .filter(|f| !previous.contains(&f.path))
            .filter(|f| !descriptors.iter().any(|d| d.path == f.path))
            .cloned()
            .collect();
        files.extend(descriptors);

        let mut next = self.clone();
        next.files = files;
        next.deployment = Some(config);
        next.updated_at = Utc::now().max(self.updated_at);
        next
    }
}
