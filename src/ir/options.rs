//! Generation options selecting the emitted runtime stack.

use serde::{Deserialize, Serialize};

use super::auth::AuthType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    Express,
    Fastify,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Express => "express",
            Framework::Fastify => "fastify",
        }
    }
}

/// SQL dialects the schema emitter can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlDialect {
    Postgres,
    Mysql,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    #[serde(alias = "postgres")]
    Postgresql,
    Mysql,
    #[serde(alias = "mongo")]
    Mongodb,
    /// In-process store; repositories are placeholders.
    Memory,
}

impl DatabaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseKind::Postgresql => "postgresql",
            DatabaseKind::Mysql => "mysql",
            DatabaseKind::Mongodb => "mongodb",
            DatabaseKind::Memory => "memory",
        }
    }

    pub fn dialect(&self) -> Option<SqlDialect> {
        match self {
            DatabaseKind::Postgresql => Some(SqlDialect::Postgres),
            DatabaseKind::Mysql => Some(SqlDialect::Mysql),
            DatabaseKind::Mongodb | DatabaseKind::Memory => None,
        }
    }

    pub fn is_relational(&self) -> bool {
        self.dialect().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[serde(alias = "ts")]
    Typescript,
    #[serde(alias = "js")]
    Javascript,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Typescript => "typescript",
            Language::Javascript => "javascript",
        }
    }

    pub fn ext(&self) -> &'static str {
        match self {
            Language::Typescript => "ts",
            Language::Javascript => "js",
        }
    }

    pub fn is_typescript(&self) -> bool {
        matches!(self, Language::Typescript)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    #[serde(default = "default_framework")]
    pub framework: Framework,
    #[serde(default = "default_database")]
    pub database: DatabaseKind,
    #[serde(default = "default_auth", alias = "authentication")]
    pub auth_type: AuthType,
    #[serde(default = "default_language")]
    pub language: Language,
    #[serde(default = "default_true")]
    pub include_tests: bool,
    #[serde(default = "default_true")]
    pub include_documentation: bool,
}

fn default_framework() -> Framework {
    Framework::Express
}

fn default_database() -> DatabaseKind {
    DatabaseKind::Postgresql
}

fn default_auth() -> AuthType {
    AuthType::Jwt
}

fn default_language() -> Language {
    Language::Typescript
}

fn default_true() -> bool {
    true
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            framework: default_framework(),
            database: default_database(),
            auth_type: default_auth(),
            language: default_language(),
            include_tests: true,
            include_documentation: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_options_fill_defaults() {
        let options: GenerationOptions =
            serde_json::from_str(r#"{"database":"mongo","language":"js"}"#).unwrap();
        assert_eq!(options.database, DatabaseKind::Mongodb);
        assert_eq!(options.language, Language::Javascript);
        assert_eq!(options.framework, Framework::Express);
        assert!(options.include_tests);
    }

    #[test]
    fn test_dialects() {
        assert_eq!(DatabaseKind::Postgresql.dialect(), Some(SqlDialect::Postgres));
        assert_eq!(DatabaseKind::Mysql.dialect(), Some(SqlDialect::Mysql));
        assert!(!DatabaseKind::Mongodb.is_relational());
        assert!(!DatabaseKind::Memory.is_relational());
    }
}
