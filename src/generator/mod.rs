//! The generation pipeline.
//!
//! `type_map` and `validation` are leaves; `endpoints` derives the REST
//! surface; `emit` and `docs` turn the IR into files; `assembler` runs them
//! all in a fixed order.

pub mod assembler;
pub mod docs;
pub mod emit;
pub mod endpoints;
pub mod naming;
pub mod type_map;
pub mod validation;
pub mod writer;

pub use assembler::{effective_auth, generate_project, ProjectInput, ProjectRequest};
pub use docs::OpenApiDocument;
pub use endpoints::{auth_endpoints, synthesize, CrudEndpoints};
pub use validation::{
    validate_model, validate_model_relationships, validate_models, IssueCode, ValidationIssue,
    ValidationResult,
};
