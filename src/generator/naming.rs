//! Identifier casing, pluralization and deterministic id helpers.

use convert_case::{Case, Casing};
use sha2::{Digest, Sha256};

use crate::ir::{EndpointOperation, Model};

pub fn pascal(s: &str) -> String {
    s.to_case(Case::Pascal)
}

pub fn camel(s: &str) -> String {
    s.to_case(Case::Camel)
}

pub fn snake(s: &str) -> String {
    s.to_case(Case::Snake)
}

pub fn kebab(s: &str) -> String {
    s.to_case(Case::Kebab)
}

/// English pluralization good enough for table and collection names.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    let lower = word.to_ascii_lowercase();
    if lower.ends_with('y') {
        let before = lower.chars().rev().nth(1);
        if !matches!(before, Some('a' | 'e' | 'i' | 'o' | 'u')) {
            return format!("{}ies", &word[..word.len() - 1]);
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| lower.ends_with(suffix)) {
        return format!("{}es", word);
    }
    format!("{}s", word)
}

/// Table name: metadata override, else snake_case pluralized model name.
pub fn table_name(model: &Model) -> String {
    match model.metadata.table_name.as_deref() {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => pluralize(&snake(&model.name)),
    }
}

pub fn column_name(field_name: &str) -> String {
    snake(field_name)
}

/// Router mount point for a model (`/product`).
pub fn resource_path(model_name: &str) -> String {
    format!("/{}", model_name.to_lowercase())
}

/// Stable file stem for a model (`order-item`).
pub fn file_stem(model_name: &str) -> String {
    kebab(model_name)
}

pub fn endpoint_id(model_name: &str, operation: EndpointOperation) -> String {
    format!("{}-{}", kebab(model_name), operation.as_str())
}

/// First 16 hex chars of SHA-256 over the given parts, NUL separated.
pub fn stable_id(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

/// Escape a string for a single-quoted JavaScript literal.
pub fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ModelMetadata;

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("batch"), "batches");
    }

    #[test]
    fn test_table_name() {
        assert_eq!(table_name(&Model::new("OrderItem")), "order_items");
        assert_eq!(table_name(&Model::new("Category")), "categories");

        let overridden = Model::new("Person").with_metadata(ModelMetadata {
            table_name: Some("people".to_string()),
            ..ModelMetadata::default()
        });
        assert_eq!(table_name(&overridden), "people");
    }

    #[test]
    fn test_casing() {
        assert_eq!(snake("createdAt"), "created_at");
        assert_eq!(kebab("OrderItem"), "order-item");
        assert_eq!(camel("OrderItem"), "orderItem");
        assert_eq!(resource_path("OrderItem"), "/orderitem");
    }

    #[test]
    fn test_stable_id_is_deterministic() {
        assert_eq!(stable_id(&["a", "b"]), stable_id(&["a", "b"]));
        assert_ne!(stable_id(&["ab", ""]), stable_id(&["a", "b"]));
        assert_eq!(stable_id(&["x"]).len(), 16);
    }

    #[test]
    fn test_js_string_escaping() {
        assert_eq!(js_string("it's"), "'it\\'s'");
        assert_eq!(js_string("a\\b"), "'a\\\\b'");
    }
}
