//! Documentation emitter: one OpenAPI document, several renderings of it.

pub mod openapi;
pub mod render;

pub use openapi::{build_document, OpenApiDocument, Operation, SchemaNames};

use crate::error::GenerationError;
use crate::ir::{ArtifactKind, GeneratedFile};

fn doc_file(path: &str, content: String, language: &str) -> GeneratedFile {
    GeneratedFile::new(path, content, ArtifactKind::Documentation).with_language(language)
}

/// The five documentation artifacts, all rendered from `doc`.
pub fn documentation_files(doc: &OpenApiDocument) -> Result<Vec<GeneratedFile>, GenerationError> {
    Ok(vec![
        doc_file("docs/openapi.json", render::to_json(doc)?, "json"),
        doc_file("docs/openapi.yaml", render::to_yaml(doc)?, "yaml"),
        doc_file("docs/index.html", render::to_html(doc)?, "html"),
        doc_file("docs/API.md", render::to_markdown(doc), "markdown"),
        doc_file("docs/postman_collection.json", render::to_postman(doc)?, "json"),
    ])
}
