//! Synthesized REST endpoints.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Lowercase form used as the OpenAPI path-item key and router method name.
    pub fn lower(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
        }
    }

    pub fn from_lower(s: &str) -> Option<Self> {
        match s {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "patch" => Some(HttpMethod::Patch),
            "delete" => Some(HttpMethod::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointOperation {
    Create,
    Read,
    Update,
    Delete,
    List,
    Register,
    Login,
    Refresh,
    Logout,
    Profile,
}

impl EndpointOperation {
    pub const CRUD: [EndpointOperation; 5] = [
        EndpointOperation::Create,
        EndpointOperation::Read,
        EndpointOperation::Update,
        EndpointOperation::Delete,
        EndpointOperation::List,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointOperation::Create => "create",
            EndpointOperation::Read => "read",
            EndpointOperation::Update => "update",
            EndpointOperation::Delete => "delete",
            EndpointOperation::List => "list",
            EndpointOperation::Register => "register",
            EndpointOperation::Login => "login",
            EndpointOperation::Refresh => "refresh",
            EndpointOperation::Logout => "logout",
            EndpointOperation::Profile => "profile",
        }
    }

    pub fn is_crud(&self) -> bool {
        Self::CRUD.contains(self)
    }
}

impl std::fmt::Display for EndpointOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub id: String,
    /// Router-style path, relative to the API prefix (`/product/:id`)
    pub path: String,
    pub method: HttpMethod,
    pub model_name: String,
    pub operation: EndpointOperation,
    pub authenticated: bool,
    pub roles: Vec<String>,
    pub description: String,
}

impl Endpoint {
    /// Path with `:param` segments rewritten to OpenAPI `{param}` form.
    pub fn openapi_path(&self) -> String {
        self.path
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(param) => format!("{{{}}}", param),
                None => segment.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Path segments relative to the model's router mount point.
    pub fn local_path(&self) -> &str {
        let trimmed = self.path.trim_start_matches('/');
        match trimmed.find('/') {
            Some(idx) => &trimmed[idx..],
            None => "/",
        }
    }

    pub fn path_params(&self) -> Vec<&str> {
        self.path
            .split('/')
            .filter_map(|segment| segment.strip_prefix(':'))
            .collect()
    }
}
