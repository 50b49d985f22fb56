use std::collections::BTreeMap;

use serde::Serialize;

use crate::deploy::adapter::{self, PlatformAdapter, RolloutStep};
use crate::deploy::{DeploymentOptions, Platform};
use crate::error::DeployError;
use crate::ir::{GeneratedFile, GeneratedProject};

const REGIONS: &[&str] = &[
    "iad", "ord", "lax", "sjc", "lhr", "ams", "fra", "cdg", "nrt", "sin", "syd", "gru",
];

pub struct FlyAdapter;

#[derive(Serialize)]
struct FlyToml {
    app: String,
    primary_region: String,
    build: FlyBuild,
    env: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deploy: Option<FlyDeploy>,
    http_service: HttpService,
}

#[derive(Serialize)]
struct FlyBuild {
    dockerfile: &'static str,
}

#[derive(Serialize)]
struct FlyDeploy {
    release_command: String,
}

#[derive(Serialize)]
struct HttpService {
    internal_port: u16,
    force_https: bool,
    auto_stop_machines: bool,
    auto_start_machines: bool,
    min_machines_running: u32,
    checks: Vec<HttpCheck>,
}

#[derive(Serialize)]
struct HttpCheck {
    grace_period: &'static str,
    interval: &'static str,
    method: &'static str,
    path: &'static str,
    timeout: &'static str,
}

impl PlatformAdapter for FlyAdapter {
    fn platform(&self) -> Platform {
        Platform::Fly
    }

    fn display_name(&self) -> &'static str {
        "Fly.io"
    }

    fn optional_env(&self) -> &'static [&'static str] {
        &["FLY_API_TOKEN"]
    }

    fn regions(&self) -> &'static [&'static str] {
        REGIONS
    }

    fn generate_deployment_files(
        &self,
        project: &GeneratedProject,
        options: &DeploymentOptions,
    ) -> Result<Vec<GeneratedFile>, DeployError> {
        let mut env = BTreeMap::new();
        env.insert("NODE_ENV".to_string(), options.environment.clone());
        env.insert("PORT".to_string(), "3000".to_string());

        let fly = FlyToml {
            app: adapter::app_slug(project),
            primary_region: self.region(options),
            build: FlyBuild {
                dockerfile: "Dockerfile",
            },
            env,
            deploy: adapter::database(project)
                .is_relational()
                .then(|| FlyDeploy {
                    release_command: "npm run db:migrate".to_string(),
                }),
            http_service: HttpService {
                internal_port: 3000,
                force_https: true,
                auto_stop_machines: true,
                auto_start_machines: true,
                min_machines_running: if options.environment == "production" { 1 } else { 0 },
                checks: vec![HttpCheck {
                    grace_period: "10s",
                    interval: "30s",
                    method: "GET",
                    path: "/health",
                    timeout: "5s",
                }],
            },
        };

        Ok(vec![
            adapter::descriptor("fly.toml", adapter::to_toml("fly.toml", &fly)?, "toml"),
            adapter::descriptor("Dockerfile", adapter::dockerfile(project, &[]), "dockerfile"),
            adapter::descriptor(".dockerignore", adapter::dockerignore(), "text"),
        ])
    }

    fn rollout_plan(&self, _options: &DeploymentOptions) -> Vec<RolloutStep> {
        vec![
            RolloutStep::new("Building image", 5000),
            RolloutStep::new("Pushing image to registry", 2500),
            RolloutStep::new("Running release command", 1500),
            RolloutStep::new("Updating machines", 3000),
            RolloutStep::new("Checking machine health", 1500),
        ]
    }

    fn deployment_url(&self, project: &GeneratedProject, options: &DeploymentOptions, _deployment_id: &str) -> String {
        adapter::public_url(options, format!("https://{}.fly.dev", adapter::app_slug(project)))
    }
}
