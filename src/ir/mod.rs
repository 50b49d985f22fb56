//! In-memory model representation consumed by the generation pipeline.
//!
//! Everything here is plain data with serde wire names matching the
//! camelCase JSON the editor and the natural-language parser produce.

mod auth;
mod endpoint;
mod field;
mod model;
mod options;
mod project;

pub use auth::*;
pub use endpoint::*;
pub use field::*;
pub use model::*;
pub use options::*;
pub use project::*;
