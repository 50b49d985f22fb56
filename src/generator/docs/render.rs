//! Renderings derived from the OpenAPI document.
//!
//! Nothing in here looks at models or endpoints; the document is the only input.

use serde_json::{json, Value};

use super::openapi::{schema_ref_name, OpenApiDocument, Operation};
use crate::error::GenerationError;

const POSTMAN_SCHEMA: &str = "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

pub fn to_json(doc: &OpenApiDocument) -> Result<String, GenerationError> {
    serde_json::to_string_pretty(doc)
        .map(|s| s + "\n")
        .map_err(|e| GenerationError::serialization("docs/openapi.json", e))
}

pub fn to_yaml(doc: &OpenApiDocument) -> Result<String, GenerationError> {
    serde_yaml::to_string(doc).map_err(|e| GenerationError::serialization("docs/openapi.yaml", e))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Standalone viewer page with the document embedded inline.
pub fn to_html(doc: &OpenApiDocument) -> Result<String, GenerationError> {
    let spec = serde_json::to_string(doc)
        .map_err(|e| GenerationError::serialization("docs/index.html", e))?
        .replace("</", "<\\/");
    let title = escape_html(&doc.info.title);

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>{title} API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    const spec = {spec};
    window.onload = () => {{
      window.ui = SwaggerUIBundle({{ spec, dom_id: '#swagger-ui', deepLinking: true }});
    }};
  </script>
</body>
</html>
"#
    ))
}

fn schema_type_label(schema: &Value) -> String {
    if let Some(name) = schema_ref_name(schema) {
        return name.to_string();
    }
    let ty = schema.get("type").and_then(Value::as_str).unwrap_or("any");
    match schema.get("format").and_then(Value::as_str) {
        Some(format) => format!("{} ({})", ty, format),
        None => ty.to_string(),
    }
}

fn constraints(schema: &Value) -> String {
    let mut parts = Vec::new();
    for (key, label) in [
        ("minLength", "min length"),
        ("maxLength", "max length"),
        ("minimum", "min"),
        ("maximum", "max"),
        ("pattern", "pattern"),
        ("default", "default"),
    ] {
        if let Some(value) = schema.get(key) {
            let rendered = match value {
                Value::String(s) => format!("`{}`", s),
                other => other.to_string(),
            };
            parts.push(format!("{}: {}", label, rendered));
        }
    }
    parts.join(", ")
}

fn markdown_schema(out: &mut String, name: &str, schema: &Value) {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    out.push_str(&format!("### Schema `{}`\n\n", name));
    out.push_str("| Field | Type | Required | Constraints |\n");
    out.push_str("| --- | --- | --- | --- |\n");
    for (field, prop) in properties {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            field,
            schema_type_label(prop),
            if required.contains(&field.as_str()) { "yes" } else { "no" },
            constraints(prop)
        ));
    }
    out.push('\n');
}

fn markdown_operation(out: &mut String, base: &str, path: &str, method: &str, op: &Operation) {
    out.push_str(&format!("### {} {}{}\n\n", method.to_uppercase(), base, path));
    out.push_str(&format!("{}\n\n", op.summary));
    if op.requires_auth() {
        if op.roles.is_empty() {
            out.push_str("**Authentication:** required\n\n");
        } else {
            out.push_str(&format!("**Authentication:** required (roles: {})\n\n", op.roles.join(", ")));
        }
    }
    if !op.parameters.is_empty() {
        out.push_str("| Parameter | In | Type | Required |\n");
        out.push_str("| --- | --- | --- | --- |\n");
        for param in &op.parameters {
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                param.name,
                param.location,
                schema_type_label(&param.schema),
                if param.required { "yes" } else { "no" }
            ));
        }
        out.push('\n');
    }
    if let Some(schema) = op.request_schema() {
        out.push_str(&format!("**Request body:** `{}`\n\n", schema));
    }
    out.push_str("**Responses:**\n\n");
    for (status, response) in &op.responses {
        match response.schema_name() {
            Some(schema) => out.push_str(&format!("- `{}` {} (`{}`)\n", status, response.description, schema)),
            None => out.push_str(&format!("- `{}` {}\n", status, response.description)),
        }
    }
    out.push('\n');
}

/// Markdown reference grouped by tag, each group followed by its entity schema.
pub fn to_markdown(doc: &OpenApiDocument) -> String {
    let base = doc.server_url();
    let mut out = String::new();
    out.push_str(&format!("# {} API\n\n", doc.info.title));
    if let Some(description) = &doc.info.description {
        out.push_str(&format!("{}\n\n", description));
    }
    out.push_str(&format!("Base URL: `{}`\n\n", base));
    if !doc.components.security_schemes.is_empty() {
        let schemes: Vec<&str> = doc.components.security_schemes.keys().map(String::as_str).collect();
        out.push_str(&format!("Security schemes: {}\n\n", schemes.join(", ")));
    }

    out.push_str("## Contents\n\n");
    for tag in &doc.tags {
        out.push_str(&format!("- [{}](#{})\n", tag.name, tag.name.to_lowercase()));
    }
    out.push('\n');

    for tag in &doc.tags {
        out.push_str(&format!("## {}\n\n", tag.name));
        if let Some(description) = &tag.description {
            out.push_str(&format!("{}\n\n", description));
        }
        for (path, method, op) in doc.operations_for(&tag.name) {
            markdown_operation(&mut out, base, path, method, op);
        }
        if let Some(schema) = doc.components.schemas.get(&tag.name) {
            markdown_schema(&mut out, &tag.name, schema);
        }
    }

    if let Some(error) = doc.components.schemas.get("Error") {
        out.push_str("## Errors\n\n");
        out.push_str("Every error response uses the same envelope:\n\n");
        markdown_schema(&mut out, "Error", error);
    }
    out
}

/// `/product/{id}` -> `/product/:id` for request-collection URLs.
fn postman_path(path: &str) -> (String, Vec<String>, Vec<String>) {
    let mut segments = Vec::new();
    let mut variables = Vec::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => {
                segments.push(format!(":{}", name));
                variables.push(name.to_string());
            }
            None => segments.push(segment.to_string()),
        }
    }
    (format!("/{}", segments.join("/")), segments, variables)
}

fn postman_request(doc: &OpenApiDocument, path: &str, method: &str, op: &Operation) -> Value {
    let (local, segments, variables) = postman_path(path);
    let query: Vec<Value> = op
        .parameters
        .iter()
        .filter(|p| p.location == "query")
        .map(|p| {
            json!({
                "key": p.name,
                "value": p.schema.get("default").map(|v| v.to_string()).unwrap_or_default(),
                "disabled": !p.required
            })
        })
        .collect();

    let mut url = json!({
        "raw": format!("{{{{baseUrl}}}}{}", local),
        "host": ["{{baseUrl}}"],
        "path": segments,
    });
    if let Some(obj) = url.as_object_mut() {
        if !variables.is_empty() {
            let vars: Vec<Value> = variables.iter().map(|v| json!({ "key": v, "value": "" })).collect();
            obj.insert("variable".to_string(), Value::Array(vars));
        }
        if !query.is_empty() {
            obj.insert("query".to_string(), Value::Array(query));
        }
    }

    let mut request = json!({
        "method": method.to_uppercase(),
        "header": [{ "key": "Content-Type", "value": "application/json" }],
        "url": url,
        "description": op.summary,
    });
    if let Some(obj) = request.as_object_mut() {
        if let Some(body) = &op.request_body {
            let example = body
                .content
                .values()
                .next()
                .and_then(|media| media.example.clone().or_else(|| example_from_schema(doc, &media.schema)))
                .unwrap_or_else(|| json!({}));
            let raw = serde_json::to_string_pretty(&example).unwrap_or_else(|_| "{}".to_string());
            obj.insert(
                "body".to_string(),
                json!({ "mode": "raw", "raw": raw, "options": { "raw": { "language": "json" } } }),
            );
        }
        if op.requires_auth() {
            let auth = if doc.components.security_schemes.contains_key("bearerAuth") {
                json!({ "type": "bearer", "bearer": [{ "key": "token", "value": "{{accessToken}}", "type": "string" }] })
            } else {
                json!({ "type": "noauth" })
            };
            obj.insert("auth".to_string(), auth);
        }
    }

    json!({ "name": op.summary, "request": request })
}

/// Example body assembled from property-level `example` values of a referenced schema.
fn example_from_schema(doc: &OpenApiDocument, schema: &Value) -> Option<Value> {
    let name = schema_ref_name(schema)?;
    let properties = doc.components.schemas.get(name)?.get("properties")?.as_object()?;
    let mut body = serde_json::Map::new();
    for (key, prop) in properties {
        if let Some(example) = prop.get("example") {
            body.insert(key.clone(), example.clone());
        }
    }
    Some(Value::Object(body))
}

/// Postman v2.1 collection with one folder per tag.
pub fn to_postman(doc: &OpenApiDocument) -> Result<String, GenerationError> {
    let folders: Vec<Value> = doc
        .tags
        .iter()
        .map(|tag| {
            let items: Vec<Value> = doc
                .operations_for(&tag.name)
                .into_iter()
                .map(|(path, method, op)| postman_request(doc, path, method, op))
                .collect();
            json!({
                "name": tag.name,
                "description": tag.description.clone().unwrap_or_default(),
                "item": items
            })
        })
        .collect();

    let mut variables = vec![json!({ "key": "baseUrl", "value": doc.server_url() })];
    if doc.components.security_schemes.contains_key("bearerAuth") {
        variables.push(json!({ "key": "accessToken", "value": "" }));
    }

    let collection = json!({
        "info": {
            "name": doc.info.title,
            "description": doc.info.description.clone().unwrap_or_default(),
            "schema": POSTMAN_SCHEMA
        },
        "item": folders,
        "variable": variables
    });
    serde_json::to_string_pretty(&collection)
        .map(|s| s + "\n")
        .map_err(|e| GenerationError::serialization("docs/postman_collection.json", e))
}

#[cfg(test)]
mod tests {
    use super::super::openapi::build_document;
    use super::*;
    use crate::generator::emit::EmitContext;
    use crate::generator::endpoints::{auth_endpoints, synthesize};
    use crate::ir::{AuthConfig, Field, FieldType, GenerationOptions, Model};

    fn document() -> OpenApiDocument {
        let models = vec![Model::new("Book")
            .with_field(Field::new("title", FieldType::String).required())
            .with_field(Field::new("pages", FieldType::Integer))];
        let auth = AuthConfig::default();
        let options = GenerationOptions::default();
        let ctx = EmitContext {
            project_name: "Library",
            models: &models,
            auth: &auth,
            options: &options,
        };
        let mut endpoints = auth_endpoints();
        endpoints.extend(synthesize(&models[0], &auth).into_vec());
        build_document(&ctx, &endpoints)
    }

    #[test]
    fn test_json_and_yaml_parse_back() {
        let doc = document();
        let from_json: OpenApiDocument = serde_json::from_str(&to_json(&doc).unwrap()).unwrap();
        assert_eq!(from_json, doc);
        let yaml = to_yaml(&doc).unwrap();
        assert!(yaml.starts_with("openapi:"));
        assert!(yaml.contains("/book/{id}:"));
    }

    #[test]
    fn test_html_embeds_document() {
        let html = to_html(&document()).unwrap();
        assert!(html.contains("<title>Library API</title>"));
        assert!(html.contains("\"openapi\":\"3.0.3\""));
        assert!(html.contains("SwaggerUIBundle"));
    }

    #[test]
    fn test_markdown_groups_by_tag() {
        let md = to_markdown(&document());
        let auth = md.find("## Auth").unwrap();
        let book = md.find("## Book").unwrap();
        assert!(auth < book);
        assert!(md.contains("### DELETE http://localhost:3000/api/book/{id}"));
        assert!(md.contains("**Authentication:** required (roles: admin)"));
        assert!(md.contains("### Schema `Book`"));
        assert!(md.contains("| title | string | yes |"));
    }

    #[test]
    fn test_postman_collection_folders() {
        let collection: Value = serde_json::from_str(&to_postman(&document()).unwrap()).unwrap();
        let folders = collection["item"].as_array().unwrap();
        assert_eq!(folders.len(), 2);
        assert_eq!(folders[0]["name"], "Auth");
        assert_eq!(folders[1]["name"], "Book");
        assert_eq!(folders[1]["item"].as_array().unwrap().len(), 5);

        let raw_urls: Vec<&str> = folders[1]["item"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["request"]["url"]["raw"].as_str().unwrap())
            .collect();
        assert!(raw_urls.contains(&"{{baseUrl}}/book/:id"));
        assert_eq!(collection["info"]["schema"], POSTMAN_SCHEMA);
    }

    #[test]
    fn test_postman_path_conversion() {
        let (local, segments, vars) = postman_path("/book/{id}");
        assert_eq!(local, "/book/:id");
        assert_eq!(segments, vec!["book", ":id"]);
        assert_eq!(vars, vec!["id"]);
    }
}
