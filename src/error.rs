//! Error types for generation and deployment.

use thiserror::Error;

use crate::generator::ValidationResult;

/// Errors raised while assembling a project.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Model validation failed with {} error(s)", .0.errors.len())]
    InvalidModels(ValidationResult),

    #[error("Two artifacts were emitted at the same path: {0}")]
    DuplicatePath(String),

    #[error("Failed to serialize {artifact}: {message}")]
    Serialization { artifact: String, message: String },
}

impl GenerationError {
    pub fn serialization(artifact: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Serialization {
            artifact: artifact.into(),
            message: err.to_string(),
        }
    }
}

/// Errors raised by deployment adapters and the orchestrator.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Deployment configuration is invalid ({} error(s))", .0.errors.len())]
    InvalidConfig(ValidationResult),

    #[error("Deployment not found: {0}")]
    NotFound(String),

    #[error("Failed to render deployment descriptor: {0}")]
    Descriptor(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::IssueCode;

    #[test]
    fn test_messages() {
        let mut result = ValidationResult::new();
        result.error("name", "Model name is required", IssueCode::InvalidModelName);
        let err = GenerationError::InvalidModels(result);
        assert_eq!(err.to_string(), "Model validation failed with 1 error(s)");

        let err = DeployError::NotFound("abc".to_string());
        assert_eq!(err.to_string(), "Deployment not found: abc");
    }
}
