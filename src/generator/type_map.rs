//! The single field-type table.
//!
//! Every emitter that needs a type decision (host-language type, column
//! type, schema fragment, validator, sample value) reads it from here.

use serde_json::{json, Map, Value};

use crate::ir::{Field, FieldType, SqlDialect};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleValue {
    Str(&'static str),
    Int(i64),
    Float(f64),
    Bool(bool),
    Object,
}

impl SampleValue {
    pub fn to_json(&self) -> Value {
        match self {
            SampleValue::Str(s) => Value::String(s.to_string()),
            SampleValue::Int(i) => json!(i),
            SampleValue::Float(f) => json!(f),
            SampleValue::Bool(b) => Value::Bool(*b),
            SampleValue::Object => json!({ "key": "value" }),
        }
    }
}

/// OpenAPI `type` + `format` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaFragment {
    pub schema_type: &'static str,
    pub format: Option<&'static str>,
}

#[derive(Debug, Clone, Copy)]
pub struct TypeMapping {
    pub field_type: FieldType,
    pub ts_type: &'static str,
    pub postgres: &'static str,
    pub mysql: &'static str,
    pub mongoose: &'static str,
    pub schema: SchemaFragment,
    pub zod: &'static str,
    pub sample: SampleValue,
}

const fn fragment(schema_type: &'static str, format: Option<&'static str>) -> SchemaFragment {
    SchemaFragment { schema_type, format }
}

static TYPE_TABLE: [TypeMapping; 12] = [
    TypeMapping {
        field_type: FieldType::String,
        ts_type: "string",
        postgres: "VARCHAR(255)",
        mysql: "VARCHAR(255)",
        mongoose: "String",
        schema: fragment("string", None),
        zod: "z.string()",
        sample: SampleValue::Str("sample text"),
    },
    TypeMapping {
        field_type: FieldType::Text,
        ts_type: "string",
        postgres: "TEXT",
        mysql: "TEXT",
        mongoose: "String",
        schema: fragment("string", None),
        zod: "z.string()",
        sample: SampleValue::Str("Lorem ipsum dolor sit amet, consectetur adipiscing elit."),
    },
    TypeMapping {
        field_type: FieldType::Integer,
        ts_type: "number",
        postgres: "INTEGER",
        mysql: "INT",
        mongoose: "Number",
        schema: fragment("integer", Some("int32")),
        zod: "z.number().int()",
        sample: SampleValue::Int(42),
    },
    TypeMapping {
        field_type: FieldType::Float,
        ts_type: "number",
        postgres: "DOUBLE PRECISION",
        mysql: "DOUBLE",
        mongoose: "Number",
        schema: fragment("number", Some("double")),
        zod: "z.number()",
        sample: SampleValue::Float(3.14),
    },
    TypeMapping {
        field_type: FieldType::Decimal,
        ts_type: "number",
        postgres: "NUMERIC(12, 2)",
        mysql: "DECIMAL(12, 2)",
        mongoose: "Number",
        schema: fragment("number", Some("decimal")),
        zod: "z.number()",
        sample: SampleValue::Float(19.99),
    },
    TypeMapping {
        field_type: FieldType::Boolean,
        ts_type: "boolean",
        postgres: "BOOLEAN",
        mysql: "BOOLEAN",
        mongoose: "Boolean",
        schema: fragment("boolean", None),
        zod: "z.boolean()",
        sample: SampleValue::Bool(true),
    },
    TypeMapping {
        field_type: FieldType::Date,
        ts_type: "Date",
        postgres: "DATE",
        mysql: "DATE",
        mongoose: "Date",
        schema: fragment("string", Some("date")),
        zod: "z.coerce.date()",
        sample: SampleValue::Str("2024-01-15"),
    },
    TypeMapping {
        field_type: FieldType::DateTime,
        ts_type: "Date",
        postgres: "TIMESTAMPTZ",
        mysql: "DATETIME(3)",
        mongoose: "Date",
        schema: fragment("string", Some("date-time")),
        zod: "z.coerce.date()",
        sample: SampleValue::Str("2024-01-15T09:30:00.000Z"),
    },
    TypeMapping {
        field_type: FieldType::Email,
        ts_type: "string",
        postgres: "VARCHAR(255)",
        mysql: "VARCHAR(255)",
        mongoose: "String",
        schema: fragment("string", Some("email")),
        zod: "z.string().email()",
        sample: SampleValue::Str("user@example.com"),
    },
    TypeMapping {
        field_type: FieldType::Url,
        ts_type: "string",
        postgres: "TEXT",
        mysql: "VARCHAR(2048)",
        mongoose: "String",
        schema: fragment("string", Some("uri")),
        zod: "z.string().url()",
        sample: SampleValue::Str("https://example.com"),
    },
    TypeMapping {
        field_type: FieldType::Uuid,
        ts_type: "string",
        postgres: "UUID",
        mysql: "CHAR(36)",
        mongoose: "String",
        schema: fragment("string", Some("uuid")),
        zod: "z.string().uuid()",
        sample: SampleValue::Str("3fa85f64-5717-4562-b3fc-2c963f66afa6"),
    },
    TypeMapping {
        field_type: FieldType::Json,
        ts_type: "Record<string, unknown>",
        postgres: "JSONB",
        mysql: "JSON",
        mongoose: "Schema.Types.Mixed",
        schema: fragment("object", None),
        zod: "z.record(z.unknown())",
        sample: SampleValue::Object,
    },
];

pub fn mapping(field_type: FieldType) -> &'static TypeMapping {
    &TYPE_TABLE[field_type.index()]
}

pub fn ts_type(field_type: FieldType) -> &'static str {
    mapping(field_type).ts_type
}

pub fn column_type(field_type: FieldType, dialect: SqlDialect) -> &'static str {
    let row = mapping(field_type);
    match dialect {
        SqlDialect::Postgres => row.postgres,
        SqlDialect::Mysql => row.mysql,
    }
}

pub fn mongoose_type(field_type: FieldType) -> &'static str {
    mapping(field_type).mongoose
}

pub fn zod_base(field_type: FieldType) -> &'static str {
    mapping(field_type).zod
}

/// Bare `{ type, format }` fragment.
pub fn schema_fragment(field_type: FieldType) -> Value {
    let frag = mapping(field_type).schema;
    let mut obj = Map::new();
    obj.insert("type".to_string(), Value::String(frag.schema_type.to_string()));
    if let Some(format) = frag.format {
        obj.insert("format".to_string(), Value::String(format.to_string()));
    }
    Value::Object(obj)
}

/// Full property schema for a field: fragment plus constraints, default and example.
pub fn field_schema(field: &Field) -> Value {
    let mut schema = schema_fragment(field.field_type);
    if let Value::Object(obj) = &mut schema {
        if let Some(description) = &field.description {
            obj.insert("description".to_string(), json!(description));
        }
        if field.field_type.is_textual() {
            if let Some(min) = field.min_length() {
                obj.insert("minLength".to_string(), json!(min));
            }
            if let Some(max) = field.max_length() {
                obj.insert("maxLength".to_string(), json!(max));
            }
        }
        if field.field_type.is_numeric() {
            if let Some(min) = field.min() {
                obj.insert("minimum".to_string(), json!(min));
            }
            if let Some(max) = field.max() {
                obj.insert("maximum".to_string(), json!(max));
            }
        }
        for rule in &field.validation {
            if let crate::ir::ValidationRule::Pattern { value, .. } = rule {
                obj.insert("pattern".to_string(), json!(value));
            }
        }
        if let Some(default) = &field.default_value {
            if default_matches(field.field_type, default) {
                obj.insert("default".to_string(), default.clone());
            }
        }
        obj.insert("example".to_string(), sample_value(field));
    }
    schema
}

/// Representative value for payloads, clamped to the field's length and range rules.
pub fn sample_value(field: &Field) -> Value {
    if let Some(default) = &field.default_value {
        if !default.is_null() && default_matches(field.field_type, default) {
            return default.clone();
        }
    }

    let base = mapping(field.field_type).sample;
    match (field.field_type, base) {
        (FieldType::String | FieldType::Text, SampleValue::Str(s)) => {
            let mut text = s.to_string();
            if let Some(min) = field.min_length() {
                while text.chars().count() < min {
                    text.push('x');
                }
            }
            if let Some(max) = field.max_length() {
                text = text.chars().take(max).collect();
            }
            Value::String(text)
        }
        (FieldType::Integer, SampleValue::Int(i)) => {
            let mut value = i as f64;
            if let Some(min) = field.min() {
                value = value.max(min.ceil());
            }
            if let Some(max) = field.max() {
                value = value.min(max.floor());
            }
            json!(value as i64)
        }
        (FieldType::Float | FieldType::Decimal, SampleValue::Float(f)) => {
            let mut value = f;
            if let Some(min) = field.min() {
                value = value.max(min);
            }
            if let Some(max) = field.max() {
                value = value.min(max);
            }
            json!(value)
        }
        (_, sample) => sample.to_json(),
    }
}

pub fn default_matches(field_type: FieldType, value: &Value) -> bool {
    if value.is_null() {
        return true;
    }
    match field_type {
        FieldType::String
        | FieldType::Text
        | FieldType::Email
        | FieldType::Url
        | FieldType::Uuid
        | FieldType::Date
        | FieldType::DateTime => value.is_string(),
        FieldType::Integer => value.is_i64() || value.is_u64(),
        FieldType::Float | FieldType::Decimal => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Json => true,
    }
}

fn quote_sql(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Render a default value as a SQL literal; `None` when the value does not fit the column.
pub fn sql_literal(field_type: FieldType, dialect: SqlDialect, value: &Value) -> Option<String> {
    if !default_matches(field_type, value) {
        return None;
    }
    match value {
        Value::Null => Some("NULL".to_string()),
        Value::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => match field_type {
            FieldType::Date if s.eq_ignore_ascii_case("now") => Some("CURRENT_DATE".to_string()),
            FieldType::DateTime if s.eq_ignore_ascii_case("now") => Some(match dialect {
                SqlDialect::Postgres => "NOW()".to_string(),
                SqlDialect::Mysql => "CURRENT_TIMESTAMP(3)".to_string(),
            }),
            FieldType::Json => Some(json_literal(dialect, &Value::String(s.clone()))),
            _ => Some(quote_sql(s)),
        },
        Value::Array(_) | Value::Object(_) => Some(json_literal(dialect, value)),
    }
}

fn json_literal(dialect: SqlDialect, value: &Value) -> String {
    let text = value.to_string();
    match dialect {
        SqlDialect::Postgres => format!("{}::jsonb", quote_sql(&text)),
        SqlDialect::Mysql => format!("({})", quote_sql(&text)),
    }
}

/// Render a JSON value as a JavaScript literal.
pub fn js_literal(value: &Value) -> String {
    match value {
        Value::String(s) => crate::generator::naming::js_string(s),
        other => other.to_string(),
    }
}
