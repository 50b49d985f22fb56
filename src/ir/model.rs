//! Models, relationships and their copy-on-write helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::field::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipKind {
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::OneToOne => "oneToOne",
            RelationshipKind::OneToMany => "oneToMany",
            RelationshipKind::ManyToMany => "manyToMany",
        }
    }
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", alias = "kind")]
    pub kind: RelationshipKind,
    pub source_model: String,
    pub target_model: String,
    pub source_field: String,
    pub target_field: String,
    #[serde(default)]
    pub cascade_delete: bool,
}

impl Relationship {
    pub fn new(
        kind: RelationshipKind,
        source_model: impl Into<String>,
        source_field: impl Into<String>,
        target_model: impl Into<String>,
        target_field: impl Into<String>,
    ) -> Self {
        let source_model = source_model.into();
        let target_model = target_model.into();
        Self {
            id: format!("rel-{}-{}", source_model, target_model),
            kind,
            source_model,
            target_model,
            source_field: source_field.into(),
            target_field: target_field.into(),
            cascade_delete: false,
        }
    }

    pub fn cascade(mut self) -> Self {
        self.cascade_delete = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default = "default_true")]
    pub timestamps: bool,
    #[serde(default)]
    pub soft_delete: bool,
    #[serde(default = "default_true")]
    pub requires_auth: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_roles: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            table_name: None,
            timestamps: true,
            soft_delete: false,
            requires_auth: true,
            allowed_roles: Vec::new(),
        }
    }
}

/// A single entity definition.
///
/// Models are values: every helper below returns a new `Model` with a
/// bumped `updated_at` and leaves the receiver untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub metadata: ModelMetadata,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: format!("model-{}", name),
            name,
            fields: Vec::new(),
            relationships: Vec::new(),
            metadata: ModelMetadata::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// True if `name` resolves to a declared field or the generated primary key.
    pub fn has_field(&self, name: &str) -> bool {
        name == "id" || self.field(name).is_some()
    }

    pub fn unique_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.unique)
    }

    fn touched(&self) -> Self {
        let mut next = self.clone();
        next.updated_at = Utc::now().max(self.updated_at);
        next
    }

    pub fn with_field(&self, field: Field) -> Self {
        let mut next = self.touched();
        next.fields.push(field);
        next
    }

    pub fn without_field(&self, name: &str) -> Self {
        let mut next = self.touched();
        next.fields.retain(|f| f.name != name);
        next
    }

    pub fn with_relationship(&self, relationship: Relationship) -> Self {
        let mut next = self.touched();
        next.relationships.push(relationship);
        next
    }

    pub fn with_metadata(&self, metadata: ModelMetadata) -> Self {
        let mut next = self.touched();
        next.metadata = metadata;
        next
    }

    pub fn renamed(&self, name: impl Into<String>) -> Self {
        let mut next = self.touched();
        next.name = name.into();
        next
    }

    pub fn public(&self) -> Self {
        let mut metadata = self.metadata.clone();
        metadata.requires_auth = false;
        self.with_metadata(metadata)
    }
}
