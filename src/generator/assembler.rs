//! Project assembly: validate, synthesize endpoints, run every emitter.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::docs::{build_document, documentation_files};
use super::emit::{auth, middleware, scaffold, schema, source, EmitContext, FileSet};
use super::endpoints::{auth_endpoints, synthesize};
use super::naming::{stable_id, table_name};
use super::validation::{check_reserved_tables, validate_models, IssueCode, ValidationResult};
use crate::error::GenerationError;
use crate::ir::{AuthConfig, GeneratedProject, GenerationOptions, Model, Relationship};

/// Everything one generation call consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    pub name: String,
    #[serde(default)]
    pub models: Vec<Model>,
    /// Standalone relationships, attached to their source model before generation
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default, alias = "auth")]
    pub auth_config: AuthConfig,
    #[serde(default, alias = "generationOptions")]
    pub options: GenerationOptions,
}

impl ProjectInput {
    pub fn new(name: impl Into<String>, models: Vec<Model>) -> Self {
        Self {
            name: name.into(),
            models,
            relationships: Vec::new(),
            auth_config: AuthConfig::default(),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_auth(mut self, auth_config: AuthConfig) -> Self {
        self.auth_config = auth_config;
        self
    }

    /// Models with the standalone relationships merged in, plus issues for
    /// relationships whose source model is missing.
    pub fn resolved_models(&self) -> (Vec<Model>, ValidationResult) {
        let mut models = self.models.clone();
        let mut result = ValidationResult::new();

        for (i, rel) in self.relationships.iter().enumerate() {
            match models.iter_mut().find(|m| m.name == rel.source_model) {
                Some(model) => {
                    if !model.relationships.contains(rel) {
                        *model = model.with_relationship(rel.clone());
                    }
                }
                None => result.error(
                    format!("relationships[{}]", i),
                    format!("Source model '{}' does not exist", rel.source_model),
                    IssueCode::UnknownSourceModel,
                ),
            }
        }
        (models, result)
    }

    /// Full validation of the resolved model set.
    pub fn validate(&self) -> ValidationResult {
        self.validated().1
    }

    fn validated(&self) -> (Vec<Model>, ValidationResult) {
        let (models, mut result) = self.resolved_models();
        result.merge(validate_models(&models));
        result.merge(check_reserved_tables(&models, &self.reserved_tables()));
        (models, result)
    }

    /// Tables owned by generated bundles rather than user models.
    fn reserved_tables(&self) -> Vec<String> {
        if self.options.auth_type.is_enabled() {
            vec![table_name(&auth::auth_user_model(&self.auth_config))]
        } else {
            Vec::new()
        }
    }
}

/// Wire form of [`ProjectInput`] where generation options may be omitted and
/// are then filled from configured defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    pub name: String,
    #[serde(default)]
    pub models: Vec<Model>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default, alias = "auth")]
    pub auth_config: Option<AuthConfig>,
    #[serde(default, alias = "generationOptions")]
    pub options: Option<GenerationOptions>,
}

impl ProjectRequest {
    pub fn into_input(self, defaults: &GenerationOptions) -> ProjectInput {
        let options = self.options.unwrap_or_else(|| defaults.clone());
        let auth_config = self.auth_config.unwrap_or_else(|| AuthConfig {
            auth_type: options.auth_type,
            ..AuthConfig::default()
        });
        ProjectInput {
            name: self.name,
            models: self.models,
            relationships: self.relationships,
            auth_config,
            options,
        }
    }
}

/// The auth policy the emitters see: the option's auth type wins.
pub fn effective_auth(config: &AuthConfig, options: &GenerationOptions) -> AuthConfig {
    if config.auth_type != options.auth_type {
        warn!(
            config = %config.auth_type,
            option = %options.auth_type,
            "Auth config type differs from generation options; using the generation option"
        );
    }
    AuthConfig {
        auth_type: options.auth_type,
        ..config.clone()
    }
}

/// Model JSON without the bookkeeping timestamps, so ids depend only on structure.
fn canonical(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("createdAt");
            map.remove("updatedAt");
            for v in map.values_mut() {
                canonical(v);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(canonical),
        _ => {}
    }
}

fn project_id(input: &ProjectInput, models: &[Model], auth: &AuthConfig) -> Result<String, GenerationError> {
    let mut models_json =
        serde_json::to_value(models).map_err(|e| GenerationError::serialization("project id", e))?;
    canonical(&mut models_json);
    let options_json =
        serde_json::to_string(&input.options).map_err(|e| GenerationError::serialization("project id", e))?;
    let auth_json = serde_json::to_string(auth).map_err(|e| GenerationError::serialization("project id", e))?;
    Ok(stable_id(&[
        &input.name,
        &models_json.to_string(),
        &options_json,
        &auth_json,
    ]))
}

/// Generate the complete project for `input`.
///
/// Fails with [`GenerationError::InvalidModels`] when validation reports any
/// error; warnings are logged and never block. Emitter order is fixed so the
/// file list is identical for identical input.
pub fn generate_project(input: &ProjectInput) -> Result<GeneratedProject, GenerationError> {
    let (models, validation) = input.validated();
    for issue in &validation.warnings {
        debug!(project = %input.name, field = %issue.field, code = %issue.code, "{}", issue.message);
    }
    if !validation.is_valid {
        warn!(
            project = %input.name,
            errors = validation.errors.len(),
            "Refusing to generate project with invalid models"
        );
        return Err(GenerationError::InvalidModels(validation));
    }

    let auth = effective_auth(&input.auth_config, &input.options);
    let ctx = EmitContext {
        project_name: &input.name,
        models: &models,
        auth: &auth,
        options: &input.options,
    };

    let mut files = FileSet::new();
    files.extend(scaffold::scaffold_files(&ctx)?)?;

    for (i, model) in models.iter().enumerate() {
        if let Some(file) = schema::model_schema_file(&ctx, model, i + 1) {
            files.push(file)?;
        }
        files.push(source::types_file(&ctx, model))?;
    }
    if let Some(dialect) = ctx.database().dialect() {
        files.push(schema::combined_schema(&ctx, dialect))?;
        if let Some(file) = schema::relationships_migration(&models, models.len() + 1, dialect) {
            files.push(file)?;
        }
    }

    let mut endpoints = Vec::new();
    if ctx.auth_enabled() {
        files.extend(auth::auth_bundle(&ctx))?;
        endpoints.extend(auth_endpoints());
    }

    for model in &models {
        let crud = synthesize(model, &auth);
        files.extend(source::crud_bundle(&ctx, model, &crud))?;
        endpoints.extend(crud.into_vec());
    }

    files.extend(middleware::middleware_files(&ctx))?;
    files.extend(middleware::entry_files(&ctx))?;

    let openapi = build_document(&ctx, &endpoints);
    if input.options.include_documentation {
        files.extend(documentation_files(&openapi)?)?;
    }

    let id = project_id(input, &models, &auth)?;
    info!(
        project = %input.name,
        project_id = %id,
        models = models.len(),
        endpoints = endpoints.len(),
        files = files.len(),
        "Generated project"
    );

    let now = Utc::now();
    Ok(GeneratedProject {
        id,
        name: input.name.clone(),
        models,
        endpoints,
        auth_config: auth,
        files: files.into_vec(),
        openapi,
        deployment: None,
        generation_options: input.options.clone(),
        created_at: now,
        updated_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{
        ArtifactKind, AuthType, DatabaseKind, Field, FieldType, Framework, Language, ModelMetadata,
        RelationshipKind, ValidationRule,
    };

    fn blog() -> ProjectInput {
        let user = Model::new("User")
            .with_field(Field::new("email", FieldType::Email).required().unique())
            .with_field(Field::new("name", FieldType::String));
        let post = Model::new("Post")
            .with_field(Field::new("title", FieldType::String).required())
            .with_field(Field::new("authorId", FieldType::Uuid).required());
        let mut input = ProjectInput::new("Blog", vec![user, post]);
        input.relationships.push(Relationship::new(
            RelationshipKind::OneToMany,
            "User",
            "id",
            "Post",
            "authorId",
        ));
        input
    }

    #[test]
    fn test_generation_is_deterministic() {
        let input = blog();
        let a = generate_project(&input).unwrap();
        let b = generate_project(&input).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.files, b.files);
        assert_eq!(a.openapi, b.openapi);
    }

    #[test]
    fn test_fixed_emitter_order() {
        let project = generate_project(&blog()).unwrap();
        let paths = project.paths();
        let position = |p: &str| paths.iter().position(|x| *x == p).unwrap();

        assert_eq!(paths[0], "package.json");
        assert!(position("src/config/database.ts") < position("database/migrations/001_create_users.sql"));
        assert!(position("src/types/post.ts") < position("database/schema.sql"));
        assert!(position("database/migrations/003_add_relationships.sql") < position("src/auth/user.types.ts"));
        assert!(position("src/auth/user.schema.sql") < position("src/controllers/user.controller.ts"));
        assert!(position("tests/post.test.ts") < position("src/middleware/error-handler.ts"));
        assert!(position("src/server.ts") < position("docs/openapi.json"));
        assert_eq!(*paths.last().unwrap(), "docs/postman_collection.json");
    }

    #[test]
    fn test_standalone_relationships_are_merged() {
        let project = generate_project(&blog()).unwrap();
        let user = project.models.iter().find(|m| m.name == "User").unwrap();
        assert_eq!(user.relationships.len(), 1);
        let schema = project.file("database/schema.sql").unwrap();
        assert!(schema.content.contains("FOREIGN KEY (author_id) REFERENCES users (id)"));
    }

    #[test]
    fn test_invalid_models_are_rejected() {
        let mut input = blog();
        input.relationships.push(Relationship::new(
            RelationshipKind::OneToMany,
            "User",
            "id",
            "Comment",
            "userId",
        ));
        let err = generate_project(&input).unwrap_err();
        match err {
            GenerationError::InvalidModels(result) => {
                assert!(result.has_error(IssueCode::UnknownTargetModel));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_source_model_is_reported() {
        let mut input = blog();
        input.relationships.push(Relationship::new(
            RelationshipKind::OneToOne,
            "Profile",
            "id",
            "User",
            "id",
        ));
        assert!(input.validate().has_error(IssueCode::UnknownSourceModel));
    }

    #[test]
    fn test_endpoint_count_with_and_without_auth() {
        let project = generate_project(&blog()).unwrap();
        assert_eq!(project.endpoints.len(), 5 + 2 * 5);

        let no_auth = blog().with_options(GenerationOptions {
            auth_type: AuthType::None,
            ..GenerationOptions::default()
        });
        let project = generate_project(&no_auth).unwrap();
        assert_eq!(project.endpoints.len(), 10);
        assert!(project.file("src/auth/auth.service.ts").is_none());
        assert!(project.endpoints.iter().all(|e| !e.authenticated));
    }

    #[test]
    fn test_options_shape_the_file_set() {
        let input = blog().with_options(GenerationOptions {
            framework: Framework::Fastify,
            database: DatabaseKind::Mongodb,
            language: Language::Javascript,
            include_tests: false,
            include_documentation: false,
            ..GenerationOptions::default()
        });
        let project = generate_project(&input).unwrap();
        assert!(project.file("tsconfig.json").is_none());
        assert!(project.file("src/models/user.model.js").is_some());
        assert!(project.file("database/schema.sql").is_none());
        assert!(project.files.iter().all(|f| f.kind != ArtifactKind::Test));
        assert!(project.files.iter().all(|f| !f.path.starts_with("docs/")));
    }

    #[test]
    fn test_option_auth_type_wins() {
        let input = blog().with_auth(AuthConfig {
            auth_type: AuthType::Session,
            ..AuthConfig::default()
        });
        let project = generate_project(&input).unwrap();
        assert_eq!(project.auth_config.auth_type, AuthType::Jwt);
        assert!(project.openapi.components.security_schemes.contains_key("bearerAuth"));
    }

    #[test]
    fn test_lookahead_pattern_still_generates() {
        let account = Model::new("Account").with_field(
            Field::new("password", FieldType::String)
                .required()
                .with_rule(ValidationRule::Pattern { value: "^(?=.*[A-Z]).{8,}$".to_string(), message: None }),
        );
        let project = generate_project(&ProjectInput::new("Accounts", vec![account])).unwrap();
        let validation = project.file("src/validation/account.validation.ts").unwrap();
        assert!(validation.content.contains("(?=.*[A-Z])"));
    }

    #[test]
    fn test_auth_table_is_reserved_only_with_auth() {
        let member = Model::new("Member")
            .with_field(Field::new("email", FieldType::Email))
            .with_metadata(ModelMetadata {
                table_name: Some("auth_users".to_string()),
                ..ModelMetadata::default()
            });
        let input = ProjectInput::new("Club", vec![member]);
        match generate_project(&input).unwrap_err() {
            GenerationError::InvalidModels(result) => {
                assert!(result.has_error(IssueCode::DuplicateTableName));
            }
            other => panic!("unexpected error: {other}"),
        }

        let input = input.with_options(GenerationOptions {
            auth_type: AuthType::None,
            ..GenerationOptions::default()
        });
        assert!(input.validate().is_valid);
        assert!(generate_project(&input).is_ok());
    }

    #[test]
    fn test_project_id_ignores_model_timestamps() {
        let a = generate_project(&blog()).unwrap();
        let mut input = blog();
        for model in &mut input.models {
            model.updated_at = model.updated_at + chrono::Duration::seconds(30);
        }
        let b = generate_project(&input).unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_request_falls_back_to_configured_options() {
        let defaults = GenerationOptions {
            framework: Framework::Fastify,
            auth_type: AuthType::Session,
            ..GenerationOptions::default()
        };
        let request: ProjectRequest =
            serde_json::from_str(r#"{"name":"Shop","models":[{"name":"Product","fields":[]}]}"#).unwrap();
        let input = request.into_input(&defaults);
        assert_eq!(input.options.framework, Framework::Fastify);
        assert_eq!(input.auth_config.auth_type, AuthType::Session);

        let request: ProjectRequest =
            serde_json::from_str(r#"{"name":"Shop","generationOptions":{"language":"javascript"}}"#).unwrap();
        let input = request.into_input(&defaults);
        assert_eq!(input.options.framework, Framework::Express);
        assert_eq!(input.options.language, Language::Javascript);
    }
}
