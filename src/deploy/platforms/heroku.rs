use serde_json::json;

use crate::deploy::adapter::{self, PlatformAdapter, RolloutStep};
use crate::deploy::{DeploymentOptions, Platform};
use crate::error::DeployError;
use crate::ir::{DatabaseKind, GeneratedFile, GeneratedProject};

const REGIONS: &[&str] = &["us", "eu"];

pub struct HerokuAdapter;

impl HerokuAdapter {
    fn addons(&self, project: &GeneratedProject) -> Vec<&'static str> {
        match adapter::database(project) {
            DatabaseKind::Postgresql => vec!["heroku-postgresql:essential-0"],
            DatabaseKind::Mysql => vec!["jawsdb:kitefin"],
            DatabaseKind::Mongodb | DatabaseKind::Memory => Vec::new(),
        }
    }
}

impl PlatformAdapter for HerokuAdapter {
    fn platform(&self) -> Platform {
        Platform::Heroku
    }

    fn display_name(&self) -> &'static str {
        "Heroku"
    }

    fn optional_env(&self) -> &'static [&'static str] {
        &["HEROKU_API_KEY"]
    }

    fn regions(&self) -> &'static [&'static str] {
        REGIONS
    }

    fn generate_deployment_files(
        &self,
        project: &GeneratedProject,
        options: &DeploymentOptions,
    ) -> Result<Vec<GeneratedFile>, DeployError> {
        let relational = adapter::database(project).is_relational();

        let mut procfile = String::new();
        if relational {
            procfile.push_str("release: npm run db:migrate\n");
        }
        procfile.push_str(&format!("web: {}\n", adapter::start_command()));

        let mut env = json!({
            "NODE_ENV": { "value": options.environment },
            "DATABASE_URL": { "description": "Database connection string", "required": true },
        });
        if adapter::uses_tokens(project) {
            env["JWT_SECRET"] = json!({ "description": "Access token signing secret", "generator": "secret" });
            env["JWT_REFRESH_SECRET"] = json!({ "description": "Refresh token signing secret", "generator": "secret" });
        }
        if adapter::uses_sessions(project) {
            env["SESSION_SECRET"] = json!({ "description": "Session cookie secret", "generator": "secret" });
        }
        let app = json!({
            "name": adapter::app_slug(project),
            "description": format!("{} API", project.name),
            "stack": "container",
            "region": self.region(options),
            "env": env,
            "addons": self.addons(project),
            "formation": { "web": { "quantity": 1, "size": "basic" } },
        });

        let mut heroku = String::new();
        heroku.push_str("build:\n  docker:\n    web: Dockerfile\n");
        if relational {
            heroku.push_str("release:\n  image: web\n  command:\n    - npm run db:migrate\n");
        }
        heroku.push_str(&format!("run:\n  web: node {}\n", adapter::server_entry(project)));

        Ok(vec![
            adapter::descriptor("Procfile", procfile, "text"),
            adapter::descriptor("app.json", adapter::to_json("app.json", &app)?, "json"),
            adapter::descriptor("heroku.yml", heroku, "yaml"),
        ])
    }

    fn rollout_plan(&self, _options: &DeploymentOptions) -> Vec<RolloutStep> {
        vec![
            RolloutStep::new("Creating slug", 1500),
            RolloutStep::new("Building container", 5000),
            RolloutStep::new("Provisioning add-ons", 2000),
            RolloutStep::new("Running release phase", 1500),
            RolloutStep::new("Starting dynos", 2000),
        ]
    }

    fn deployment_url(&self, project: &GeneratedProject, options: &DeploymentOptions, deployment_id: &str) -> String {
        let suffix: String = adapter::short_id(deployment_id).chars().take(6).collect();
        adapter::public_url(
            options,
            format!("https://{}-{}.herokuapp.com", adapter::app_slug(project), suffix),
        )
    }
}
