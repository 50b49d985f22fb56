//! Authentication policy for generated projects.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    #[serde(alias = "token")]
    Jwt,
    Oauth,
    Session,
    None,
}

impl AuthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::Jwt => "jwt",
            AuthType::Oauth => "oauth",
            AuthType::Session => "session",
            AuthType::None => "none",
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, AuthType::None)
    }

    /// Token-based strategies issue bearer tokens; session auth uses cookies.
    pub fn uses_tokens(&self) -> bool {
        matches!(self, AuthType::Jwt | AuthType::Oauth)
    }
}

impl std::fmt::Display for AuthType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Role {
    pub fn new(name: impl Into<String>, permissions: &[&str]) -> Self {
        Self {
            name: name.into(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtSettings {
    #[serde(default = "default_expires_in")]
    pub expires_in: String,
    #[serde(default = "default_refresh_expires_in")]
    pub refresh_expires_in: String,
}

fn default_expires_in() -> String {
    "15m".to_string()
}

fn default_refresh_expires_in() -> String {
    "7d".to_string()
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            expires_in: default_expires_in(),
            refresh_expires_in: default_refresh_expires_in(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthSettings {
    #[serde(default)]
    pub providers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSettings {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
}

fn default_cookie_name() -> String {
    "sid".to_string()
}

fn default_max_age_secs() -> u64 {
    86_400
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            max_age_secs: default_max_age_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    #[serde(rename = "type", default = "default_auth_type")]
    pub auth_type: AuthType,
    #[serde(default = "default_roles")]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub protected_routes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt: Option<JwtSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth: Option<OAuthSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionSettings>,
}

fn default_auth_type() -> AuthType {
    AuthType::Jwt
}

fn default_roles() -> Vec<Role> {
    vec![
        Role::new("admin", &["create", "read", "update", "delete"]),
        Role::new("user", &["create", "read", "update"]),
    ]
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            auth_type: default_auth_type(),
            roles: default_roles(),
            protected_routes: Vec::new(),
            jwt: None,
            oauth: None,
            session: None,
        }
    }
}

impl AuthConfig {
    pub fn disabled() -> Self {
        Self {
            auth_type: AuthType::None,
            roles: Vec::new(),
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.auth_type.is_enabled()
    }

    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }

    /// The role new accounts receive: `user` when configured, else the last role.
    pub fn default_role(&self) -> String {
        if self.roles.iter().any(|r| r.name == "user") {
            return "user".to_string();
        }
        self.roles
            .last()
            .map(|r| r.name.clone())
            .unwrap_or_else(|| "user".to_string())
    }

    pub fn jwt_settings(&self) -> JwtSettings {
        self.jwt.clone().unwrap_or_default()
    }

    pub fn session_settings(&self) -> SessionSettings {
        self.session.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_alias_parses_as_jwt() {
        let config: AuthConfig = serde_json::from_str(r#"{"type":"token"}"#).unwrap();
        assert_eq!(config.auth_type, AuthType::Jwt);
        assert_eq!(config.role_names(), vec!["admin", "user"]);
    }

    #[test]
    fn test_default_role_falls_back_to_last() {
        let config = AuthConfig {
            roles: vec![Role::new("admin", &[]), Role::new("editor", &[])],
            ..AuthConfig::default()
        };
        assert_eq!(config.default_role(), "editor");
    }

    #[test]
    fn test_disabled_config() {
        let config = AuthConfig::disabled();
        assert!(!config.is_enabled());
        assert!(config.role_names().is_empty());
    }
}
