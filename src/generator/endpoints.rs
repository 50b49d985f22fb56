//! CRUD endpoint synthesis.

use serde::Serialize;

use super::naming;
use crate::ir::{AuthConfig, Endpoint, EndpointOperation, HttpMethod, Model};

/// The five canonical endpoints for one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrudEndpoints {
    pub create: Endpoint,
    pub read: Endpoint,
    pub update: Endpoint,
    pub delete: Endpoint,
    pub list: Endpoint,
}

impl CrudEndpoints {
    /// Endpoints in router registration order.
    pub fn into_vec(self) -> Vec<Endpoint> {
        vec![self.list, self.read, self.create, self.update, self.delete]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        [&self.list, &self.read, &self.create, &self.update, &self.delete].into_iter()
    }
}

/// Derive the CRUD endpoint set for `model`.
///
/// Read and list are public. Create and update inherit the model's policy and
/// its `allowedRoles`, falling back to every configured role. Delete is
/// protected whenever the model is, and then always restricted to `admin`.
/// Nothing is protected when auth is disabled.
pub fn synthesize(model: &Model, auth: &AuthConfig) -> CrudEndpoints {
    let should_protect = auth.is_enabled() && model.metadata.requires_auth;
    let base = naming::resource_path(&model.name);
    let item = format!("{}/:id", base);
    let roles = match should_protect {
        true if !model.metadata.allowed_roles.is_empty() => model.metadata.allowed_roles.clone(),
        true => auth.role_names(),
        false => Vec::new(),
    };

    let endpoint = |operation: EndpointOperation,
                    method: HttpMethod,
                    path: &str,
                    authenticated: bool,
                    roles: Vec<String>,
                    description: String| Endpoint {
        id: naming::endpoint_id(&model.name, operation),
        path: path.to_string(),
        method,
        model_name: model.name.clone(),
        operation,
        authenticated,
        roles,
        description,
    };

    let plural = naming::pluralize(&model.name);

    CrudEndpoints {
        create: endpoint(
            EndpointOperation::Create,
            HttpMethod::Post,
            &base,
            should_protect,
            roles.clone(),
            format!("Create a new {}", model.name),
        ),
        read: endpoint(
            EndpointOperation::Read,
            HttpMethod::Get,
            &item,
            false,
            Vec::new(),
            format!("Get a {} by id", model.name),
        ),
        update: endpoint(
            EndpointOperation::Update,
            HttpMethod::Put,
            &item,
            should_protect,
            roles,
            format!("Update an existing {}", model.name),
        ),
        delete: endpoint(
            EndpointOperation::Delete,
            HttpMethod::Delete,
            &item,
            should_protect,
            if should_protect { vec!["admin".to_string()] } else { Vec::new() },
            format!("Delete a {}", model.name),
        ),
        list: endpoint(
            EndpointOperation::List,
            HttpMethod::Get,
            &base,
            false,
            Vec::new(),
            format!("List {} with pagination", plural),
        ),
    }
}

/// Fixed endpoints served by the auth bundle.
pub fn auth_endpoints() -> Vec<Endpoint> {
    let endpoint = |operation: EndpointOperation,
                    method: HttpMethod,
                    suffix: &str,
                    authenticated: bool,
                    description: &str| Endpoint {
        id: naming::endpoint_id("Auth", operation),
        path: format!("/auth/{}", suffix),
        method,
        model_name: "User".to_string(),
        operation,
        authenticated,
        roles: Vec::new(),
        description: description.to_string(),
    };

    vec![
        endpoint(EndpointOperation::Register, HttpMethod::Post, "register", false, "Register a new account"),
        endpoint(EndpointOperation::Login, HttpMethod::Post, "login", false, "Authenticate with email and password"),
        endpoint(EndpointOperation::Refresh, HttpMethod::Post, "refresh", false, "Exchange a refresh credential for a new session"),
        endpoint(EndpointOperation::Logout, HttpMethod::Post, "logout", true, "Invalidate the current session"),
        endpoint(EndpointOperation::Profile, HttpMethod::Get, "profile", true, "Get the authenticated user's profile"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{AuthType, Field, FieldType, ModelMetadata, Role};

    fn product() -> Model {
        Model::new("Product").with_field(Field::new("name", FieldType::String).required())
    }

    #[test]
    fn test_paths() {
        let crud = synthesize(&product(), &AuthConfig::default());
        assert_eq!(crud.list.path, "/product");
        assert_eq!(crud.create.path, "/product");
        assert_eq!(crud.read.path, "/product/:id");
        assert_eq!(crud.update.path, "/product/:id");
        assert_eq!(crud.delete.path, "/product/:id");
        assert_eq!(crud.update.method, HttpMethod::Put);
    }

    #[test]
    fn test_public_model_has_no_protected_endpoints() {
        let crud = synthesize(&product().public(), &AuthConfig::default());
        assert!(crud.iter().all(|e| !e.authenticated));
        assert!(crud.iter().all(|e| e.roles.is_empty()));
    }

    #[test]
    fn test_protected_model_delete_is_admin_only() {
        let auth = AuthConfig {
            roles: vec![Role::new("user", &[]), Role::new("editor", &[]), Role::new("admin", &[])],
            ..AuthConfig::default()
        };
        let crud = synthesize(&product(), &auth);

        assert!(!crud.read.authenticated);
        assert!(!crud.list.authenticated);
        assert!(crud.create.authenticated);
        assert!(crud.update.authenticated);
        assert_eq!(crud.create.roles, vec!["user", "editor", "admin"]);
        assert!(crud.delete.authenticated);
        assert_eq!(crud.delete.roles, vec!["admin"]);
    }

    #[test]
    fn test_allowed_roles_override_configured_roles() {
        let auth = AuthConfig {
            roles: vec![Role::new("user", &[]), Role::new("editor", &[]), Role::new("admin", &[])],
            ..AuthConfig::default()
        };
        let model = product().with_metadata(ModelMetadata {
            allowed_roles: vec!["editor".to_string()],
            ..ModelMetadata::default()
        });
        let crud = synthesize(&model, &auth);

        assert_eq!(crud.create.roles, vec!["editor"]);
        assert_eq!(crud.update.roles, vec!["editor"]);
        assert_eq!(crud.delete.roles, vec!["admin"]);

        let public = synthesize(&model.public(), &auth);
        assert!(public.create.roles.is_empty());
    }

    #[test]
    fn test_disabled_auth_protects_nothing() {
        let auth = AuthConfig {
            auth_type: AuthType::None,
            ..AuthConfig::default()
        };
        let crud = synthesize(&product(), &auth);
        assert!(crud.iter().all(|e| !e.authenticated));
    }

    #[test]
    fn test_ids_are_deterministic() {
        let a = synthesize(&product(), &AuthConfig::default());
        let b = synthesize(&product(), &AuthConfig::default());
        assert_eq!(a, b);
        assert_eq!(a.create.id, "product-create");
    }

    #[test]
    fn test_auth_endpoints() {
        let endpoints = auth_endpoints();
        assert_eq!(endpoints.len(), 5);
        let protected: Vec<_> = endpoints.iter().filter(|e| e.authenticated).map(|e| e.path.as_str()).collect();
        assert_eq!(protected, vec!["/auth/logout", "/auth/profile"]);
    }
}
