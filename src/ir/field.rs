//! Field definitions and the fixed field-type enumeration.

use serde::{Deserialize, Serialize};

/// Abstract field types understood by the generation pipeline.
///
/// The discriminant order matches the row order of the type table in
/// `generator::type_map`; do not reorder without updating that table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Text,
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    #[serde(alias = "dateTime", alias = "timestamp")]
    DateTime,
    Email,
    Url,
    Uuid,
    Json,
}

impl FieldType {
    pub const ALL: [FieldType; 12] = [
        FieldType::String,
        FieldType::Text,
        FieldType::Integer,
        FieldType::Float,
        FieldType::Decimal,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::DateTime,
        FieldType::Email,
        FieldType::Url,
        FieldType::Uuid,
        FieldType::Json,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Decimal => "decimal",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Uuid => "uuid",
            FieldType::Json => "json",
        }
    }

    /// Row index into the type table.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            FieldType::String | FieldType::Text | FieldType::Email | FieldType::Url | FieldType::Uuid
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float | FieldType::Decimal)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed constraint attached to a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ValidationRule {
    MinLength {
        value: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    MaxLength {
        value: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Min {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Max {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Pattern {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Named rule resolved by a user-supplied predicate in the generated code
    Custom {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl ValidationRule {
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationRule::MinLength { .. } => "minLength",
            ValidationRule::MaxLength { .. } => "maxLength",
            ValidationRule::Min { .. } => "min",
            ValidationRule::Max { .. } => "max",
            ValidationRule::Pattern { .. } => "pattern",
            ValidationRule::Custom { .. } => "custom",
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ValidationRule::MinLength { message, .. }
            | ValidationRule::MaxLength { message, .. }
            | ValidationRule::Min { message, .. }
            | ValidationRule::Max { message, .. }
            | ValidationRule::Pattern { message, .. }
            | ValidationRule::Custom { message, .. } => message.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            id: format!("field-{}", name),
            name,
            field_type,
            required: false,
            unique: false,
            default_value: None,
            validation: Vec::new(),
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation.push(rule);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn min_length(&self) -> Option<usize> {
        self.validation.iter().find_map(|r| match r {
            ValidationRule::MinLength { value, .. } => Some(*value),
            _ => None,
        })
    }

    pub fn max_length(&self) -> Option<usize> {
        self.validation.iter().find_map(|r| match r {
            ValidationRule::MaxLength { value, .. } => Some(*value),
            _ => None,
        })
    }

    pub fn min(&self) -> Option<f64> {
        self.validation.iter().find_map(|r| match r {
            ValidationRule::Min { value, .. } => Some(*value),
            _ => None,
        })
    }

    pub fn max(&self) -> Option<f64> {
        self.validation.iter().find_map(|r| match r {
            ValidationRule::Max { value, .. } => Some(*value),
            _ => None,
        })
    }
}
