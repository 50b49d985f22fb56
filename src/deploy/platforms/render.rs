use serde::Serialize;

use crate::deploy::adapter::{self, PlatformAdapter, RolloutStep};
use crate::deploy::{DeploymentOptions, Platform};
use crate::error::DeployError;
use crate::generator::naming;
use crate::ir::{GeneratedFile, GeneratedProject};

const REGIONS: &[&str] = &["oregon", "ohio", "virginia", "frankfurt", "singapore"];

pub struct RenderAdapter;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Blueprint {
    services: Vec<Service>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    databases: Vec<Database>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Service {
    #[serde(rename = "type")]
    kind: &'static str,
    name: String,
    runtime: &'static str,
    region: String,
    plan: &'static str,
    build_command: String,
    start_command: String,
    health_check_path: &'static str,
    env_vars: Vec<EnvVar>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    domains: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvVar {
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sync: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generate_value: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_database: Option<FromDatabase>,
}

impl EnvVar {
    fn value(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            value: Some(value.into()),
            sync: None,
            generate_value: None,
            from_database: None,
        }
    }

    /// Set in the dashboard rather than committed.
    fn unsynced(key: &str) -> Self {
        Self {
            key: key.to_string(),
            value: None,
            sync: Some(false),
            generate_value: None,
            from_database: None,
        }
    }

    fn generated(key: &str) -> Self {
        Self {
            key: key.to_string(),
            value: None,
            sync: None,
            generate_value: Some(true),
            from_database: None,
        }
    }
}

#[derive(Serialize)]
struct FromDatabase {
    name: String,
    property: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Database {
    name: String,
    database_name: String,
    region: String,
    plan: &'static str,
}

impl PlatformAdapter for RenderAdapter {
    fn platform(&self) -> Platform {
        Platform::Render
    }

    fn display_name(&self) -> &'static str {
        "Render"
    }

    fn optional_env(&self) -> &'static [&'static str] {
        &["RENDER_API_KEY"]
    }

    fn regions(&self) -> &'static [&'static str] {
        REGIONS
    }

    fn generate_deployment_files(
        &self,
        project: &GeneratedProject,
        options: &DeploymentOptions,
    ) -> Result<Vec<GeneratedFile>, DeployError> {
        let slug = adapter::app_slug(project);
        let region = self.region(options);
        let relational = adapter::database(project).is_relational();
        let db_name = format!("{}-db", slug);

        let mut env_vars = vec![
            EnvVar::value("NODE_ENV", options.environment.clone()),
            EnvVar::value("PORT", "3000"),
        ];
        if relational {
            env_vars.push(EnvVar {
                key: "DATABASE_URL".to_string(),
                value: None,
                sync: None,
                generate_value: None,
                from_database: Some(FromDatabase {
                    name: db_name.clone(),
                    property: "connectionString",
                }),
            });
        } else {
            env_vars.push(EnvVar::unsynced("DATABASE_URL"));
        }
        if adapter::uses_tokens(project) {
            env_vars.push(EnvVar::generated("JWT_SECRET"));
            env_vars.push(EnvVar::generated("JWT_REFRESH_SECRET"));
        }
        if adapter::uses_sessions(project) {
            env_vars.push(EnvVar::generated("SESSION_SECRET"));
        }

        let mut build_command = adapter::install_command().to_string();
        if adapter::is_typescript(project) {
            build_command.push_str(" && npm run build");
        }
        let start_command = if relational {
            format!("npm run db:migrate && {}", adapter::start_command())
        } else {
            adapter::start_command().to_string()
        };

        let databases = if relational {
            vec![Database {
                name: db_name,
                database_name: naming::snake(&project.name),
                region: region.clone(),
                plan: "starter",
            }]
        } else {
            Vec::new()
        };

        let blueprint = Blueprint {
            services: vec![Service {
                kind: "web",
                name: slug,
                runtime: "node",
                region,
                plan: "starter",
                build_command,
                start_command,
                health_check_path: "/health",
                env_vars,
                domains: options.custom_domain.iter().cloned().collect(),
            }],
            databases,
        };

        Ok(vec![adapter::descriptor(
            "render.yaml",
            adapter::to_yaml("render.yaml", &blueprint)?,
            "yaml",
        )])
    }

    fn rollout_plan(&self, _options: &DeploymentOptions) -> Vec<RolloutStep> {
        vec![
            RolloutStep::new("Syncing blueprint", 1000),
            RolloutStep::new("Provisioning database", 3000),
            RolloutStep::new("Building service", 5000),
            RolloutStep::new("Deploying service", 3000),
            RolloutStep::new("Waiting for health check", 2000),
        ]
    }

    fn deployment_url(&self, project: &GeneratedProject, options: &DeploymentOptions, _deployment_id: &str) -> String {
        adapter::public_url(options, format!("https://{}.onrender.com", adapter::app_slug(project)))
    }
}
