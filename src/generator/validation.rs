//! Model validation.
//!
//! Validators never fail fast: every call walks the whole input and returns
//! all errors and warnings it found as `(field, message, code)` triples.
//! Callers decide whether warnings matter.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::naming;
use super::type_map;
use crate::ir::{Field, Model, ValidationRule};

lazy_static! {
    /// PascalCase model names
    static ref MODEL_NAME_REGEX: Regex = Regex::new(r"^[A-Z][A-Za-z0-9]*$").unwrap();

    /// Field names usable as JS identifiers and SQL columns
    static ref FIELD_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap();

    /// Unquoted SQL identifiers
    static ref TABLE_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();

    /// Lookaround and backreferences: valid in JavaScript, unsupported by `regex`
    static ref JS_ONLY_SYNTAX_REGEX: Regex = Regex::new(r"\(\?<?[=!]|\\[1-9]|\\k<").unwrap();
}

/// Model names that collide with routes the generator always owns.
const RESERVED_MODEL_NAMES: &[&str] = &["Auth", "Health"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    // Model shape
    InvalidModelName,
    DuplicateModelName,
    ReservedModelName,
    InvalidTableName,
    DuplicateTableName,
    EmptyFields,
    InvalidFieldName,
    DuplicateFieldName,
    ReservedFieldName,
    InvalidValidationRule,
    DefaultTypeMismatch,

    // Relationships
    UnknownSourceModel,
    UnknownTargetModel,
    MissingSourceField,
    MissingTargetField,
    SelfRelationship,
    RelationshipCycle,

    // Deployment configuration
    MissingEnvVar,
    OptionalEnvVarMissing,
    InvalidEnvVarName,
    UnknownRegion,
    InvalidDomain,
    InvalidEnvironment,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::InvalidModelName => "invalid_model_name",
            IssueCode::DuplicateModelName => "duplicate_model_name",
            IssueCode::ReservedModelName => "reserved_model_name",
            IssueCode::InvalidTableName => "invalid_table_name",
            IssueCode::DuplicateTableName => "duplicate_table_name",
            IssueCode::EmptyFields => "empty_fields",
            IssueCode::InvalidFieldName => "invalid_field_name",
            IssueCode::DuplicateFieldName => "duplicate_field_name",
            IssueCode::ReservedFieldName => "reserved_field_name",
            IssueCode::InvalidValidationRule => "invalid_validation_rule",
            IssueCode::DefaultTypeMismatch => "default_type_mismatch",
            IssueCode::UnknownSourceModel => "unknown_source_model",
            IssueCode::UnknownTargetModel => "unknown_target_model",
            IssueCode::MissingSourceField => "missing_source_field",
            IssueCode::MissingTargetField => "missing_target_field",
            IssueCode::SelfRelationship => "self_relationship",
            IssueCode::RelationshipCycle => "relationship_cycle",
            IssueCode::MissingEnvVar => "missing_env_var",
            IssueCode::OptionalEnvVarMissing => "optional_env_var_missing",
            IssueCode::InvalidEnvVarName => "invalid_env_var_name",
            IssueCode::UnknownRegion => "unknown_region",
            IssueCode::InvalidDomain => "invalid_domain",
            IssueCode::InvalidEnvironment => "invalid_environment",
        }
    }
}

impl std::fmt::Display for IssueCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
    pub code: IssueCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: impl Into<String>, message: impl Into<String>, code: IssueCode) {
        self.errors.push(ValidationIssue {
            field: field.into(),
            message: message.into(),
            code,
        });
        self.is_valid = false;
    }

    pub fn warning(&mut self, field: impl Into<String>, message: impl Into<String>, code: IssueCode) {
        self.warnings.push(ValidationIssue {
            field: field.into(),
            message: message.into(),
            code,
        });
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.is_valid &= other.is_valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn has_error(&self, code: IssueCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    pub fn has_warning(&self, code: IssueCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }

    /// Error messages grouped by field, the shape the HTTP error envelope uses.
    pub fn errors_by_field(&self) -> HashMap<String, Vec<String>> {
        let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
        for issue in &self.errors {
            grouped
                .entry(issue.field.clone())
                .or_default()
                .push(format!("[{}] {}", issue.code, issue.message));
        }
        grouped
    }
}

/// Check one model's shape: name, fields, rules and defaults.
pub fn validate_model(model: &Model) -> ValidationResult {
    let mut result = ValidationResult::new();
    let name = model.name.as_str();

    if name.trim().is_empty() {
        result.error("name", "Model name is required", IssueCode::InvalidModelName);
    } else if !MODEL_NAME_REGEX.is_match(name) {
        result.error(
            name,
            format!("Model name '{}' must be PascalCase (letters and digits, starting uppercase)", name),
            IssueCode::InvalidModelName,
        );
    } else if RESERVED_MODEL_NAMES.contains(&name) {
        result.error(
            name,
            format!("Model name '{}' collides with a generated route", name),
            IssueCode::ReservedModelName,
        );
    }

    if let Some(table) = model.metadata.table_name.as_deref().filter(|t| !t.trim().is_empty()) {
        if !TABLE_NAME_REGEX.is_match(table.trim()) {
            result.error(
                format!("{}.metadata.tableName", name),
                format!(
                    "Table name '{}' must start with a letter or underscore and contain only letters, digits and underscores",
                    table
                ),
                IssueCode::InvalidTableName,
            );
        }
    }

    if model.fields.is_empty() {
        result.error(
            format!("{}.fields", name),
            format!("Model '{}' must declare at least one field", name),
            IssueCode::EmptyFields,
        );
    }

    check_duplicate_fields(model, &mut result);

    let reserved = reserved_field_names(model);
    for field in &model.fields {
        let path = format!("{}.{}", name, field.name);

        if !FIELD_NAME_REGEX.is_match(&field.name) {
            result.error(
                &path,
                format!(
                    "Field name '{}' must start with a letter and contain only letters, digits and underscores",
                    field.name
                ),
                IssueCode::InvalidFieldName,
            );
        }

        if reserved.contains(&field.name.as_str()) {
            result.error(
                &path,
                format!("Field '{}' is generated automatically and cannot be declared", field.name),
                IssueCode::ReservedFieldName,
            );
        }

        check_rules(field, &path, &mut result);

        if let Some(default) = &field.default_value {
            if !type_map::default_matches(field.field_type, default) {
                result.warning(
                    &path,
                    format!(
                        "Default value {} does not match field type '{}' and will be ignored",
                        default, field.field_type
                    ),
                    IssueCode::DefaultTypeMismatch,
                );
            }
        }
    }

    result
}

fn reserved_field_names(model: &Model) -> Vec<&'static str> {
    let mut names = vec!["id"];
    if model.metadata.timestamps {
        names.extend(["createdAt", "updatedAt"]);
    }
    if model.metadata.soft_delete {
        names.push("deletedAt");
    }
    names
}

fn check_duplicate_fields(model: &Model, result: &mut ValidationResult) {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for field in &model.fields {
        let column = naming::column_name(&field.name);
        if let Some(previous) = seen.get(&column) {
            let message = if *previous == field.name {
                format!("Duplicate field name '{}' in model '{}'", field.name, model.name)
            } else {
                format!(
                    "Fields '{}' and '{}' in model '{}' map to the same column '{}'",
                    previous, field.name, model.name, column
                )
            };
            result.error(
                format!("{}.{}", model.name, field.name),
                message,
                IssueCode::DuplicateFieldName,
            );
        } else {
            seen.insert(column, &field.name);
        }
    }
}

fn check_rules(field: &Field, path: &str, result: &mut ValidationResult) {
    for rule in &field.validation {
        match rule {
            ValidationRule::MinLength { .. } | ValidationRule::MaxLength { .. }
                if !field.field_type.is_textual() =>
            {
                result.warning(
                    path,
                    format!("{} rule has no effect on '{}' fields", rule.kind(), field.field_type),
                    IssueCode::InvalidValidationRule,
                );
            }
            ValidationRule::Min { .. } | ValidationRule::Max { .. } if !field.field_type.is_numeric() => {
                result.warning(
                    path,
                    format!("{} rule has no effect on '{}' fields", rule.kind(), field.field_type),
                    IssueCode::InvalidValidationRule,
                );
            }
            ValidationRule::Pattern { value, .. } => match Regex::new(value) {
                Ok(_) => {}
                Err(_) if JS_ONLY_SYNTAX_REGEX.is_match(value) => result.warning(
                    path,
                    format!("Pattern '{}' uses lookaround or backreferences and is only checked at runtime", value),
                    IssueCode::InvalidValidationRule,
                ),
                Err(e) => result.error(
                    path,
                    format!("Invalid pattern '{}': {}", value, e),
                    IssueCode::InvalidValidationRule,
                ),
            },
            ValidationRule::Custom { value, .. } => {
                if !FIELD_NAME_REGEX.is_match(value) {
                    result.error(
                        path,
                        format!("Custom rule name '{}' must be a valid identifier", value),
                        IssueCode::InvalidValidationRule,
                    );
                }
            }
            _ => {}
        }
    }

    if let (Some(min), Some(max)) = (field.min_length(), field.max_length()) {
        if min > max {
            result.error(
                path,
                format!("minLength ({}) exceeds maxLength ({})", min, max),
                IssueCode::InvalidValidationRule,
            );
        }
    }
    if let (Some(min), Some(max)) = (field.min(), field.max()) {
        if min > max {
            result.error(
                path,
                format!("min ({}) exceeds max ({})", min, max),
                IssueCode::InvalidValidationRule,
            );
        }
    }
}

fn check_duplicate_models(models: &[Model], result: &mut ValidationResult) {
    let mut seen = BTreeSet::new();
    for model in models {
        if !seen.insert(model.name.as_str()) {
            result.error(
                &model.name,
                format!("Duplicate model name '{}'", model.name),
                IssueCode::DuplicateModelName,
            );
        }
    }
}

fn check_duplicate_tables(models: &[Model], result: &mut ValidationResult) {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for model in models {
        let table = naming::table_name(model);
        match seen.get(&table.to_lowercase()) {
            Some(previous) => result.error(
                format!("{}.metadata.tableName", model.name),
                format!("Models '{}' and '{}' both map to table '{}'", previous, model.name, table),
                IssueCode::DuplicateTableName,
            ),
            None => {
                seen.insert(table.to_lowercase(), &model.name);
            }
        }
    }
}

/// Models whose table collides with one the generator owns (`auth_users`).
pub fn check_reserved_tables(models: &[Model], reserved: &[String]) -> ValidationResult {
    let mut result = ValidationResult::new();
    for model in models {
        let table = naming::table_name(model);
        if reserved.iter().any(|r| r.eq_ignore_ascii_case(&table)) {
            result.error(
                format!("{}.metadata.tableName", model.name),
                format!("Table '{}' is reserved for generated code", table),
                IssueCode::DuplicateTableName,
            );
        }
    }
    result
}

fn check_relationships(models: &[Model], index: &HashMap<&str, &Model>, result: &mut ValidationResult) {
    for model in models {
        for (i, rel) in model.relationships.iter().enumerate() {
            let path = format!("{}.relationships[{}]", model.name, i);

            match index.get(rel.source_model.as_str()) {
                None => result.error(
                    &path,
                    format!("Source model '{}' does not exist", rel.source_model),
                    IssueCode::UnknownSourceModel,
                ),
                Some(source) if !source.has_field(&rel.source_field) => result.error(
                    &path,
                    format!(
                        "Source field '{}' does not exist on model '{}'",
                        rel.source_field, rel.source_model
                    ),
                    IssueCode::MissingSourceField,
                ),
                Some(_) => {}
            }

            match index.get(rel.target_model.as_str()) {
                None => result.error(
                    &path,
                    format!("Target model '{}' does not exist", rel.target_model),
                    IssueCode::UnknownTargetModel,
                ),
                Some(target) if !target.has_field(&rel.target_field) => result.error(
                    &path,
                    format!(
                        "Target field '{}' does not exist on model '{}'",
                        rel.target_field, rel.target_model
                    ),
                    IssueCode::MissingTargetField,
                ),
                Some(_) => {}
            }

            if rel.source_model == rel.target_model {
                result.warning(
                    &path,
                    format!("Model '{}' references itself", rel.source_model),
                    IssueCode::SelfRelationship,
                );
            }
        }
    }
}

/// Relationship cycles are legal in a relational schema; they are reported
/// as warnings because cascading deletes around a cycle are easy to get wrong.
fn check_cycles(models: &[Model], index: &HashMap<&str, &Model>, result: &mut ValidationResult) {
    let mut graph: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for model in models {
        for rel in &model.relationships {
            if rel.source_model == rel.target_model {
                continue;
            }
            if index.contains_key(rel.source_model.as_str()) && index.contains_key(rel.target_model.as_str()) {
                graph
                    .entry(rel.source_model.as_str())
                    .or_default()
                    .insert(rel.target_model.as_str());
            }
        }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<'a>(
        node: &'a str,
        graph: &BTreeMap<&'a str, BTreeSet<&'a str>>,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
        cycles: &mut Vec<Vec<&'a str>>,
    ) {
        marks.insert(node, Mark::Visiting);
        stack.push(node);
        if let Some(next) = graph.get(node) {
            for &target in next {
                match marks.get(target) {
                    Some(Mark::Visiting) => {
                        if let Some(start) = stack.iter().position(|n| *n == target) {
                            let mut cycle: Vec<&str> = stack[start..].to_vec();
                            cycle.push(target);
                            cycles.push(cycle);
                        }
                    }
                    Some(Mark::Done) => {}
                    None => visit(target, graph, marks, stack, cycles),
                }
            }
        }
        stack.pop();
        marks.insert(node, Mark::Done);
    }

    let mut marks = HashMap::new();
    let mut cycles = Vec::new();
    for &node in graph.keys() {
        if !marks.contains_key(node) {
            let mut stack = Vec::new();
            visit(node, &graph, &mut marks, &mut stack, &mut cycles);
        }
    }

    for cycle in cycles {
        let head = cycle.first().copied().unwrap_or_default();
        result.warning(
            head,
            format!("Relationship cycle detected: {}", cycle.join(" -> ")),
            IssueCode::RelationshipCycle,
        );
    }
}

fn build_index(models: &[Model]) -> HashMap<&str, &Model> {
    let mut index = HashMap::with_capacity(models.len());
    for model in models {
        index.entry(model.name.as_str()).or_insert(model);
    }
    index
}

/// Cross-model referential integrity for a model set.
pub fn validate_model_relationships(models: &[Model]) -> ValidationResult {
    let mut result = ValidationResult::new();
    let index = build_index(models);

    check_duplicate_models(models, &mut result);
    for model in models {
        check_duplicate_fields(model, &mut result);
    }
    check_relationships(models, &index, &mut result);
    check_cycles(models, &index, &mut result);

    result
}

/// Per-model checks plus referential integrity in a single pass.
pub fn validate_models(models: &[Model]) -> ValidationResult {
    let mut result = ValidationResult::new();
    let index = build_index(models);

    for model in models {
        result.merge(validate_model(model));
    }
    check_duplicate_models(models, &mut result);
    check_duplicate_tables(models, &mut result);
    check_relationships(models, &index, &mut result);
    check_cycles(models, &index, &mut result);

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FieldType, ModelMetadata, Relationship, RelationshipKind};
    use serde_json::json;

    fn user() -> Model {
        Model::new("User")
            .with_field(Field::new("email", FieldType::Email).required().unique())
            .with_field(Field::new("name", FieldType::String))
    }

    fn post() -> Model {
        Model::new("Post")
            .with_field(Field::new("title", FieldType::String).required())
            .with_field(Field::new("authorId", FieldType::Uuid).required())
    }

    #[test]
    fn test_valid_model() {
        let result = validate_model(&user());
        assert!(result.is_valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_invalid_names_are_all_reported() {
        let model = Model::new("bad name")
            .with_field(Field::new("1st", FieldType::String))
            .with_field(Field::new("ok_field", FieldType::String))
            .with_field(Field::new("ok_field", FieldType::Integer));
        let result = validate_model(&model);

        assert!(!result.is_valid);
        assert!(result.has_error(IssueCode::InvalidModelName));
        assert!(result.has_error(IssueCode::InvalidFieldName));
        assert!(result.has_error(IssueCode::DuplicateFieldName));
    }

    #[test]
    fn test_empty_fields() {
        let result = validate_model(&Model::new("Empty"));
        assert!(result.has_error(IssueCode::EmptyFields));
    }

    #[test]
    fn test_reserved_names() {
        let model = Model::new("Auth").with_field(Field::new("id", FieldType::Uuid));
        let result = validate_model(&model);
        assert!(result.has_error(IssueCode::ReservedModelName));
        assert!(result.has_error(IssueCode::ReservedFieldName));
    }

    #[test]
    fn test_column_collision_is_duplicate() {
        let model = Model::new("Account")
            .with_field(Field::new("userName", FieldType::String))
            .with_field(Field::new("user_name", FieldType::String));
        assert!(validate_model(&model).has_error(IssueCode::DuplicateFieldName));
    }

    #[test]
    fn test_rule_checks() {
        let model = Model::new("Item")
            .with_field(
                Field::new("code", FieldType::String)
                    .with_rule(ValidationRule::MinLength { value: 10, message: None })
                    .with_rule(ValidationRule::MaxLength { value: 2, message: None })
                    .with_rule(ValidationRule::Pattern { value: "([".to_string(), message: None }),
            )
            .with_field(
                Field::new("flag", FieldType::Boolean)
                    .with_rule(ValidationRule::Min { value: 1.0, message: None })
                    .with_default(json!("yes")),
            );
        let result = validate_model(&model);
        let rule_errors = result
            .errors
            .iter()
            .filter(|e| e.code == IssueCode::InvalidValidationRule)
            .count();
        assert_eq!(rule_errors, 2);
        assert!(result.has_warning(IssueCode::InvalidValidationRule));
        assert!(result.has_warning(IssueCode::DefaultTypeMismatch));
    }

    #[test]
    fn test_one_to_many_relationship_is_valid() {
        let user = user().with_relationship(Relationship::new(
            RelationshipKind::OneToMany,
            "User",
            "id",
            "Post",
            "authorId",
        ));
        let result = validate_model_relationships(&[user, post()]);
        assert!(result.is_valid, "{:?}", result.errors);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_unknown_target_model() {
        let user = user().with_relationship(Relationship::new(
            RelationshipKind::OneToMany,
            "User",
            "id",
            "Comment",
            "authorId",
        ));
        let result = validate_model_relationships(&[user, post()]);
        assert!(!result.is_valid);
        assert!(result.has_error(IssueCode::UnknownTargetModel));
    }

    #[test]
    fn test_missing_fields() {
        let user = user().with_relationship(Relationship::new(
            RelationshipKind::OneToOne,
            "User",
            "profileId",
            "Post",
            "ownerId",
        ));
        let result = validate_model_relationships(&[user, post()]);
        assert!(result.has_error(IssueCode::MissingSourceField));
        assert!(result.has_error(IssueCode::MissingTargetField));
    }

    #[test]
    fn test_duplicate_models() {
        let result = validate_model_relationships(&[user(), user()]);
        assert!(result.has_error(IssueCode::DuplicateModelName));
    }

    #[test]
    fn test_cycle_is_a_warning() {
        let user = user().with_relationship(Relationship::new(
            RelationshipKind::OneToMany,
            "User",
            "id",
            "Post",
            "authorId",
        ));
        let post = post().with_relationship(Relationship::new(
            RelationshipKind::OneToOne,
            "Post",
            "authorId",
            "User",
            "id",
        ));
        let result = validate_model_relationships(&[user, post]);
        assert!(result.is_valid);
        assert!(result.has_warning(IssueCode::RelationshipCycle));
    }

    #[test]
    fn test_self_relationship_warning() {
        let category = Model::new("Category")
            .with_field(Field::new("parentId", FieldType::Uuid))
            .with_relationship(Relationship::new(
                RelationshipKind::OneToMany,
                "Category",
                "id",
                "Category",
                "parentId",
            ));
        let result = validate_models(&[category]);
        assert!(result.is_valid);
        assert!(result.has_warning(IssueCode::SelfRelationship));
        assert!(!result.has_warning(IssueCode::RelationshipCycle));
    }

    #[test]
    fn test_validate_models_reports_duplicate_fields_once() {
        let model = Model::new("Thing")
            .with_field(Field::new("a", FieldType::String))
            .with_field(Field::new("a", FieldType::String));
        let result = validate_models(&[model]);
        let count = result
            .errors
            .iter()
            .filter(|e| e.code == IssueCode::DuplicateFieldName)
            .count();
        assert_eq!(count, 1);
    }

    fn with_table(model: Model, table: &str) -> Model {
        model.with_metadata(ModelMetadata {
            table_name: Some(table.to_string()),
            ..ModelMetadata::default()
        })
    }

    #[test]
    fn test_lookaround_pattern_is_a_warning() {
        let model = Model::new("Account").with_field(
            Field::new("password", FieldType::String)
                .with_rule(ValidationRule::Pattern { value: "^(?=.*[A-Z]).{8,}$".to_string(), message: None }),
        );
        let result = validate_model(&model);
        assert!(result.is_valid, "{:?}", result.errors);
        assert!(result.has_warning(IssueCode::InvalidValidationRule));

        let model = Model::new("Pair").with_field(
            Field::new("code", FieldType::String)
                .with_rule(ValidationRule::Pattern { value: r"^(\w)\1$".to_string(), message: None }),
        );
        assert!(validate_model(&model).is_valid);
    }

    #[test]
    fn test_invalid_table_name() {
        let model = with_table(user(), "people'); DROP TABLE x; --");
        let result = validate_model(&model);
        assert!(!result.is_valid);
        assert!(result.has_error(IssueCode::InvalidTableName));
        assert_eq!(result.errors[0].field, "User.metadata.tableName");

        assert!(validate_model(&with_table(user(), "app_users")).is_valid);
    }

    #[test]
    fn test_duplicate_table_names() {
        let result = validate_models(&[with_table(user(), "things"), with_table(post(), "things")]);
        assert!(!result.is_valid);
        assert!(result.has_error(IssueCode::DuplicateTableName));

        // Default names collide with an override too
        let result = validate_models(&[user(), with_table(post(), "Users")]);
        assert!(result.has_error(IssueCode::DuplicateTableName));
    }

    #[test]
    fn test_reserved_table_name() {
        let reserved = vec!["auth_users".to_string()];
        let result = check_reserved_tables(&[with_table(user(), "auth_users")], &reserved);
        assert!(result.has_error(IssueCode::DuplicateTableName));
        assert!(check_reserved_tables(&[user(), post()], &reserved).is_valid);
    }
}
