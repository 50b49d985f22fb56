//! Typed OpenAPI 3.0 document and its builder.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::generator::emit::auth::auth_user_model;
use crate::generator::emit::source::sample_payload;
use crate::generator::emit::EmitContext;
use crate::generator::naming;
use crate::generator::type_map::field_schema;
use crate::ir::{AuthType, DatabaseKind, Endpoint, EndpointOperation, Model};

pub const OPENAPI_VERSION: &str = "3.0.3";
pub const AUTH_TAG: &str = "Auth";
pub const DEFAULT_SERVER: &str = "http://localhost:3000/api";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    pub servers: Vec<Server>,
    pub tags: Vec<Tag>,
    pub paths: BTreeMap<String, PathItem>,
    pub components: Components,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Operations keyed by lowercase HTTP method.
pub type PathItem = BTreeMap<String, Operation>;

pub type SecurityRequirement = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub tags: Vec<String>,
    pub summary: String,
    pub operation_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<String, ApiResponse>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirement>,
    #[serde(rename = "x-roles", default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl Operation {
    pub fn requires_auth(&self) -> bool {
        !self.security.is_empty()
    }

    /// Schema name referenced by the JSON request body, if any.
    pub fn request_schema(&self) -> Option<&str> {
        self.request_body
            .as_ref()
            .and_then(|body| body.content.get(JSON))
            .and_then(|media| schema_ref_name(&media.schema))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    pub required: bool,
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, MediaType>,
}

impl ApiResponse {
    pub fn schema_name(&self) -> Option<&str> {
        self.content.get(JSON).and_then(|media| schema_ref_name(&media.schema))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    pub schemas: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub security_schemes: BTreeMap<String, Value>,
}

const JSON: &str = "application/json";
const SCHEMA_PREFIX: &str = "#/components/schemas/";

pub fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("{}{}", SCHEMA_PREFIX, name) })
}

pub fn schema_ref_name(schema: &Value) -> Option<&str> {
    schema
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|r| r.strip_prefix(SCHEMA_PREFIX))
}

fn json_content(schema: Value, example: Option<Value>) -> BTreeMap<String, MediaType> {
    let mut content = BTreeMap::new();
    content.insert(JSON.to_string(), MediaType { schema, example });
    content
}

fn response(description: &str, schema: Option<&str>) -> ApiResponse {
    ApiResponse {
        description: description.to_string(),
        content: schema
            .map(|name| json_content(schema_ref(name), None))
            .unwrap_or_default(),
    }
}

fn error_response(description: &str) -> ApiResponse {
    response(description, Some("Error"))
}

fn id_schema(database: DatabaseKind) -> Value {
    match database {
        DatabaseKind::Mongodb => json!({ "type": "string", "pattern": "^[a-f0-9]{24}$" }),
        _ => json!({ "type": "string", "format": "uuid" }),
    }
}

/// Base entity schema: generated id, declared fields, then generated timestamps.
pub fn model_schema(model: &Model, database: DatabaseKind) -> Value {
    let mut properties = Map::new();
    let mut required = vec![json!("id")];
    properties.insert("id".to_string(), id_schema(database));
    for field in &model.fields {
        properties.insert(field.name.clone(), field_schema(field));
        if field.required {
            required.push(json!(field.name));
        }
    }
    if model.metadata.timestamps {
        properties.insert("createdAt".to_string(), json!({ "type": "string", "format": "date-time" }));
        properties.insert("updatedAt".to_string(), json!({ "type": "string", "format": "date-time" }));
        required.push(json!("createdAt"));
        required.push(json!("updatedAt"));
    }
    if model.metadata.soft_delete {
        properties.insert(
            "deletedAt".to_string(),
            json!({ "type": "string", "format": "date-time", "nullable": true }),
        );
    }
    json!({ "type": "object", "properties": properties, "required": required })
}

fn input_schema(model: &Model, create: bool) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in &model.fields {
        properties.insert(field.name.clone(), field_schema(field));
        if create && field.required && field.default_value.is_none() {
            required.push(json!(field.name));
        }
    }
    let mut schema = json!({ "type": "object", "properties": properties });
    if let Value::Object(obj) = &mut schema {
        if !required.is_empty() {
            obj.insert("required".to_string(), Value::Array(required));
        }
        if !create {
            obj.insert("minProperties".to_string(), json!(1));
        }
    }
    schema
}

fn shared_schemas(schemas: &mut BTreeMap<String, Value>) {
    schemas.insert(
        "Pagination".to_string(),
        json!({
            "type": "object",
            "properties": {
                "page": { "type": "integer", "minimum": 1, "example": 1 },
                "limit": { "type": "integer", "minimum": 1, "maximum": 100, "example": 20 },
                "total": { "type": "integer", "minimum": 0, "example": 1 },
                "totalPages": { "type": "integer", "minimum": 0, "example": 1 }
            },
            "required": ["page", "limit", "total", "totalPages"]
        }),
    );
    schemas.insert(
        "Error".to_string(),
        json!({
            "type": "object",
            "properties": {
                "error": {
                    "type": "object",
                    "properties": {
                        "code": { "type": "string", "example": "validation_error" },
                        "message": { "type": "string" },
                        "details": { "type": "object", "additionalProperties": true }
                    },
                    "required": ["code", "message"]
                }
            },
            "required": ["error"]
        }),
    );
}

/// Names of the five component schemas registered per model.
#[derive(Debug, Clone)]
pub struct SchemaNames {
    pub base: String,
    pub create: String,
    pub update: String,
    pub item: String,
    pub list: String,
}

impl SchemaNames {
    pub fn of(model_name: &str) -> Self {
        let pascal = naming::pascal(model_name);
        Self {
            create: format!("Create{}Request", pascal),
            update: format!("Update{}Request", pascal),
            item: format!("{}Response", pascal),
            list: format!("{}ListResponse", pascal),
            base: pascal,
        }
    }
}

fn model_schemas(model: &Model, database: DatabaseKind, schemas: &mut BTreeMap<String, Value>) {
    let names = SchemaNames::of(&model.name);
    schemas.insert(names.base.clone(), model_schema(model, database));
    schemas.insert(names.create.clone(), input_schema(model, true));
    schemas.insert(names.update.clone(), input_schema(model, false));
    schemas.insert(
        names.item.clone(),
        json!({
            "type": "object",
            "properties": { "data": schema_ref(&names.base) },
            "required": ["data"]
        }),
    );
    schemas.insert(
        names.list.clone(),
        json!({
            "type": "object",
            "properties": {
                "data": { "type": "array", "items": schema_ref(&names.base) },
                "pagination": schema_ref("Pagination")
            },
            "required": ["data", "pagination"]
        }),
    );
}

fn auth_schemas(ctx: &EmitContext<'_>, schemas: &mut BTreeMap<String, Value>) {
    let mut user = model_schema(&auth_user_model(ctx.auth), ctx.database());
    if let Some(obj) = user.as_object_mut() {
        if let Some(Value::Object(props)) = obj.get_mut("properties") {
            props.remove("passwordHash");
        }
        if let Some(Value::Array(required)) = obj.get_mut("required") {
            required.retain(|v| v != "passwordHash");
        }
    }
    schemas.insert("AuthUser".to_string(), user);
    schemas.insert(
        "RegisterRequest".to_string(),
        json!({
            "type": "object",
            "properties": {
                "email": { "type": "string", "format": "email", "example": "user@example.com" },
                "password": { "type": "string", "minLength": 8, "maxLength": 128, "example": "correct-horse-battery" },
                "name": { "type": "string", "minLength": 1, "maxLength": 100, "example": "Ada Lovelace" }
            },
            "required": ["email", "password"]
        }),
    );
    schemas.insert(
        "LoginRequest".to_string(),
        json!({
            "type": "object",
            "properties": {
                "email": { "type": "string", "format": "email", "example": "user@example.com" },
                "password": { "type": "string", "example": "correct-horse-battery" }
            },
            "required": ["email", "password"]
        }),
    );
    schemas.insert(
        "UserResponse".to_string(),
        json!({
            "type": "object",
            "properties": { "data": schema_ref("AuthUser") },
            "required": ["data"]
        }),
    );
    if ctx.options.auth_type.uses_tokens() {
        schemas.insert(
            "RefreshRequest".to_string(),
            json!({
                "type": "object",
                "properties": { "refreshToken": { "type": "string" } },
                "required": ["refreshToken"]
            }),
        );
        schemas.insert(
            "AuthResponse".to_string(),
            json!({
                "type": "object",
                "properties": {
                    "user": schema_ref("AuthUser"),
                    "accessToken": { "type": "string" },
                    "refreshToken": { "type": "string" }
                },
                "required": ["user", "accessToken", "refreshToken"]
            }),
        );
    }
}

fn security_scheme(ctx: &EmitContext<'_>) -> Option<(&'static str, Value)> {
    match ctx.options.auth_type {
        AuthType::Jwt | AuthType::Oauth => Some((
            "bearerAuth",
            json!({ "type": "http", "scheme": "bearer", "bearerFormat": "JWT" }),
        )),
        AuthType::Session => Some((
            "cookieAuth",
            json!({ "type": "apiKey", "in": "cookie", "name": ctx.auth.session_settings().cookie_name }),
        )),
        AuthType::None => None,
    }
}

fn id_parameter(model_name: &str, database: DatabaseKind) -> Parameter {
    Parameter {
        name: "id".to_string(),
        location: "path".to_string(),
        required: true,
        description: Some(format!("{} identifier", model_name)),
        schema: id_schema(database),
    }
}

fn pagination_parameters() -> Vec<Parameter> {
    vec![
        Parameter {
            name: "page".to_string(),
            location: "query".to_string(),
            required: false,
            description: Some("Page number, starting at 1".to_string()),
            schema: json!({ "type": "integer", "minimum": 1, "default": 1 }),
        },
        Parameter {
            name: "limit".to_string(),
            location: "query".to_string(),
            required: false,
            description: Some("Items per page".to_string()),
            schema: json!({ "type": "integer", "minimum": 1, "maximum": 100, "default": 20 }),
        },
    ]
}

fn request_body(schema: &str, example: Option<Value>) -> Option<RequestBody> {
    Some(RequestBody {
        required: true,
        content: json_content(schema_ref(schema), example),
    })
}

fn crud_operation(ctx: &EmitContext<'_>, endpoint: &Endpoint) -> Operation {
    let names = SchemaNames::of(&endpoint.model_name);
    let model = ctx.models.iter().find(|m| m.name == endpoint.model_name);
    let has_unique = model.map(|m| m.unique_fields().next().is_some()).unwrap_or(false);
    let example = model.map(sample_payload);
    let database = ctx.database();

    let mut parameters = Vec::new();
    let mut body = None;
    let mut responses = BTreeMap::new();
    match endpoint.operation {
        EndpointOperation::List => {
            parameters = pagination_parameters();
            responses.insert("200".to_string(), response("Paginated list", Some(names.list.as_str())));
            responses.insert("400".to_string(), error_response("Invalid pagination parameters"));
        }
        EndpointOperation::Read => {
            parameters.push(id_parameter(&endpoint.model_name, database));
            responses.insert("200".to_string(), response(&format!("The {}", endpoint.model_name), Some(names.item.as_str())));
            responses.insert("404".to_string(), error_response(&format!("{} not found", endpoint.model_name)));
        }
        EndpointOperation::Create => {
            body = request_body(&names.create, example);
            responses.insert("201".to_string(), response(&format!("{} created", endpoint.model_name), Some(names.item.as_str())));
            responses.insert("400".to_string(), error_response("Validation failed"));
            if has_unique {
                responses.insert("409".to_string(), error_response("A unique field value is already taken"));
            }
        }
        EndpointOperation::Update => {
            parameters.push(id_parameter(&endpoint.model_name, database));
            body = request_body(&names.update, example);
            responses.insert("200".to_string(), response(&format!("{} updated", endpoint.model_name), Some(names.item.as_str())));
            responses.insert("400".to_string(), error_response("Validation failed"));
            responses.insert("404".to_string(), error_response(&format!("{} not found", endpoint.model_name)));
            if has_unique {
                responses.insert("409".to_string(), error_response("A unique field value is already taken"));
            }
        }
        EndpointOperation::Delete => {
            parameters.push(id_parameter(&endpoint.model_name, database));
            responses.insert("204".to_string(), response(&format!("{} deleted", endpoint.model_name), None));
            responses.insert("404".to_string(), error_response(&format!("{} not found", endpoint.model_name)));
        }
        _ => {}
    }

    Operation {
        tags: vec![names.base],
        summary: endpoint.description.clone(),
        operation_id: endpoint.id.clone(),
        parameters,
        request_body: body,
        responses,
        security: Vec::new(),
        roles: Vec::new(),
    }
}

fn auth_operation(ctx: &EmitContext<'_>, endpoint: &Endpoint) -> Operation {
    let tokens = ctx.options.auth_type.uses_tokens();
    let success = if tokens { "AuthResponse" } else { "UserResponse" };
    let mut body = None;
    let mut responses = BTreeMap::new();
    match endpoint.operation {
        EndpointOperation::Register => {
            body = request_body("RegisterRequest", None);
            responses.insert("201".to_string(), response("Account created", Some(success)));
            responses.insert("400".to_string(), error_response("Validation failed"));
            responses.insert("409".to_string(), error_response("Email already registered"));
        }
        EndpointOperation::Login => {
            body = request_body("LoginRequest", None);
            responses.insert("200".to_string(), response("Authenticated", Some(success)));
            responses.insert("400".to_string(), error_response("Validation failed"));
            responses.insert("401".to_string(), error_response("Invalid credentials"));
        }
        EndpointOperation::Refresh => {
            if tokens {
                body = request_body("RefreshRequest", None);
            }
            responses.insert("200".to_string(), response("Session renewed", Some(success)));
            responses.insert("401".to_string(), error_response("Refresh credential is invalid or expired"));
        }
        EndpointOperation::Logout => {
            responses.insert("204".to_string(), response("Logged out", None));
        }
        EndpointOperation::Profile => {
            responses.insert("200".to_string(), response("Current account", Some("UserResponse")));
            responses.insert("404".to_string(), error_response("Account no longer exists"));
        }
        _ => {}
    }

    Operation {
        tags: vec![AUTH_TAG.to_string()],
        summary: endpoint.description.clone(),
        operation_id: endpoint.id.clone(),
        parameters: Vec::new(),
        request_body: body,
        responses,
        security: Vec::new(),
        roles: Vec::new(),
    }
}

/// Build the document from the model set, synthesized endpoints and auth policy.
pub fn build_document(ctx: &EmitContext<'_>, endpoints: &[Endpoint]) -> OpenApiDocument {
    let auth_on = ctx.auth_enabled();
    let scheme = if auth_on { security_scheme(ctx) } else { None };

    let mut components = Components::default();
    shared_schemas(&mut components.schemas);
    for model in ctx.models {
        model_schemas(model, ctx.database(), &mut components.schemas);
    }
    if auth_on {
        auth_schemas(ctx, &mut components.schemas);
    }
    if let Some((name, value)) = &scheme {
        components.security_schemes.insert(name.to_string(), value.clone());
    }

    let mut tags = Vec::new();
    if auth_on && endpoints.iter().any(|e| !e.operation.is_crud()) {
        tags.push(Tag {
            name: AUTH_TAG.to_string(),
            description: Some("Account registration and sessions".to_string()),
        });
    }
    for model in ctx.models {
        tags.push(Tag {
            name: naming::pascal(&model.name),
            description: Some(format!("{} operations", model.name)),
        });
    }

    let mut paths: BTreeMap<String, PathItem> = BTreeMap::new();
    for endpoint in endpoints {
        if !endpoint.operation.is_crud() && !auth_on {
            continue;
        }
        let mut operation = if endpoint.operation.is_crud() {
            crud_operation(ctx, endpoint)
        } else {
            auth_operation(ctx, endpoint)
        };
        if auth_on && endpoint.authenticated {
            if let Some((name, _)) = &scheme {
                let mut requirement = SecurityRequirement::new();
                requirement.insert(name.to_string(), Vec::new());
                operation.security.push(requirement);
            }
            operation
                .responses
                .insert("401".to_string(), error_response("Authentication required"));
            if !endpoint.roles.is_empty() {
                operation.roles = endpoint.roles.clone();
                operation
                    .responses
                    .insert("403".to_string(), error_response("Insufficient role"));
            }
        }
        paths
            .entry(endpoint.openapi_path())
            .or_default()
            .insert(endpoint.method.lower().to_string(), operation);
    }

    OpenApiDocument {
        openapi: OPENAPI_VERSION.to_string(),
        info: Info {
            title: ctx.project_name.to_string(),
            version: "1.0.0".to_string(),
            description: Some(format!(
                "REST API for {} ({} / {})",
                ctx.project_name,
                ctx.options.framework.as_str(),
                ctx.database().as_str()
            )),
        },
        servers: vec![Server {
            url: DEFAULT_SERVER.to_string(),
            description: Some("Local development".to_string()),
        }],
        tags,
        paths,
        components,
    }
}

impl OpenApiDocument {
    pub fn server_url(&self) -> &str {
        self.servers.first().map(|s| s.url.as_str()).unwrap_or(DEFAULT_SERVER)
    }

    /// `(path, method, operation)` triples carrying `tag`, sorted by path then method.
    pub fn operations_for(&self, tag: &str) -> Vec<(&str, &str, &Operation)> {
        let mut out = Vec::new();
        for (path, item) in &self.paths {
            for (method, operation) in item {
                if operation.tags.iter().any(|t| t == tag) {
                    out.push((path.as_str(), method.as_str(), operation));
                }
            }
        }
        out
    }

    pub fn operation_count(&self) -> usize {
        self.paths.values().map(|item| item.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::endpoints::{auth_endpoints, synthesize};
    use crate::ir::{AuthConfig, Field, FieldType, GenerationOptions};

    fn product() -> Model {
        Model::new("Product")
            .with_field(Field::new("name", FieldType::String).required())
            .with_field(Field::new("sku", FieldType::String).required().unique())
            .with_field(Field::new("price", FieldType::Decimal))
    }

    fn document(options: GenerationOptions) -> OpenApiDocument {
        let models = vec![product()];
        let auth = AuthConfig::default();
        let ctx = EmitContext {
            project_name: "Shop",
            models: &models,
            auth: &auth,
            options: &options,
        };
        let mut endpoints = auth_endpoints();
        endpoints.extend(synthesize(&models[0], &auth).into_vec());
        build_document(&ctx, &endpoints)
    }

    #[test]
    fn test_paths_and_operations() {
        let doc = document(GenerationOptions::default());
        assert_eq!(doc.openapi, "3.0.3");
        assert!(doc.paths.contains_key("/product"));
        assert!(doc.paths.contains_key("/product/{id}"));
        assert!(doc.paths.contains_key("/auth/login"));
        assert_eq!(doc.operation_count(), 10);
        assert_eq!(doc.tags[0].name, "Auth");
    }

    #[test]
    fn test_protected_delete_has_admin_role() {
        let doc = document(GenerationOptions::default());
        let delete = &doc.paths["/product/{id}"]["delete"];
        assert!(delete.requires_auth());
        assert_eq!(delete.roles, vec!["admin"]);
        assert!(delete.responses.contains_key("401"));
        assert!(delete.responses.contains_key("403"));
        assert!(delete.responses.contains_key("204"));

        let read = &doc.paths["/product/{id}"]["get"];
        assert!(!read.requires_auth());
        assert!(!read.responses.contains_key("401"));
    }

    #[test]
    fn test_model_schemas_registered() {
        let doc = document(GenerationOptions::default());
        for name in [
            "Product",
            "CreateProductRequest",
            "UpdateProductRequest",
            "ProductResponse",
            "ProductListResponse",
            "Pagination",
            "Error",
            "AuthUser",
        ] {
            assert!(doc.components.schemas.contains_key(name), "missing {}", name);
        }
        let create = &doc.components.schemas["CreateProductRequest"];
        assert_eq!(create["required"], json!(["name", "sku"]));
        let user = &doc.components.schemas["AuthUser"];
        assert!(user["properties"].get("passwordHash").is_none());
    }

    #[test]
    fn test_unique_fields_add_conflict_response() {
        let doc = document(GenerationOptions::default());
        let create = &doc.paths["/product"]["post"];
        assert!(create.responses.contains_key("409"));
        assert_eq!(create.request_schema(), Some("CreateProductRequest"));
    }

    #[test]
    fn test_disabled_auth_drops_auth_paths() {
        let doc = document(GenerationOptions {
            auth_type: AuthType::None,
            ..GenerationOptions::default()
        });
        assert!(!doc.paths.contains_key("/auth/login"));
        assert!(doc.components.security_schemes.is_empty());
        assert!(doc.paths.values().flat_map(|item| item.values()).all(|op| !op.requires_auth()));
    }

    #[test]
    fn test_session_auth_uses_cookie_scheme() {
        let doc = document(GenerationOptions {
            auth_type: AuthType::Session,
            ..GenerationOptions::default()
        });
        assert!(doc.components.security_schemes.contains_key("cookieAuth"));
        assert!(!doc.components.schemas.contains_key("RefreshRequest"));
        let refresh = &doc.paths["/auth/refresh"]["post"];
        assert!(refresh.request_body.is_none());
    }
}
