use serde::Serialize;
use serde_json::json;

use crate::deploy::adapter::{self, PlatformAdapter, RolloutStep};
use crate::deploy::{DeploymentOptions, Platform};
use crate::error::DeployError;
use crate::ir::{GeneratedFile, GeneratedProject};

const REGIONS: &[&str] = &["us-west2", "us-east4", "europe-west4", "asia-southeast1"];

pub struct RailwayAdapter;

#[derive(Serialize)]
struct Nixpacks {
    phases: NixpacksPhases,
    start: NixpacksStart,
}

#[derive(Serialize)]
struct NixpacksPhases {
    setup: NixpacksSetup,
    install: NixpacksCommands,
    #[serde(skip_serializing_if = "Option::is_none")]
    build: Option<NixpacksCommands>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NixpacksSetup {
    nix_pkgs: Vec<String>,
}

#[derive(Serialize)]
struct NixpacksCommands {
    cmds: Vec<String>,
}

#[derive(Serialize)]
struct NixpacksStart {
    cmd: String,
}

impl PlatformAdapter for RailwayAdapter {
    fn platform(&self) -> Platform {
        Platform::Railway
    }

    fn display_name(&self) -> &'static str {
        "Railway"
    }

    fn optional_env(&self) -> &'static [&'static str] {
        &["RAILWAY_TOKEN"]
    }

    fn regions(&self) -> &'static [&'static str] {
        REGIONS
    }

    fn generate_deployment_files(
        &self,
        project: &GeneratedProject,
        options: &DeploymentOptions,
    ) -> Result<Vec<GeneratedFile>, DeployError> {
        let mut build = json!({ "builder": "NIXPACKS" });
        if let Some(command) = adapter::build_command(project) {
            build["buildCommand"] = json!(command);
        }
        let mut deploy = json!({
            "startCommand": adapter::start_command(),
            "healthcheckPath": "/health",
            "healthcheckTimeout": 100,
            "restartPolicyType": "ON_FAILURE",
            "restartPolicyMaxRetries": 10,
            "region": self.region(options),
        });
        if adapter::database(project).is_relational() {
            deploy["preDeployCommand"] = json!("npm run db:migrate");
        }
        let railway = json!({
            "$schema": "https://railway.app/railway.schema.json",
            "build": build,
            "deploy": deploy,
        });

        let nixpacks = Nixpacks {
            phases: NixpacksPhases {
                setup: NixpacksSetup {
                    nix_pkgs: vec!["nodejs_20".to_string()],
                },
                install: NixpacksCommands {
                    cmds: vec![adapter::install_command().to_string()],
                },
                build: adapter::is_typescript(project).then(|| NixpacksCommands {
                    cmds: vec!["npm run build".to_string()],
                }),
            },
            start: NixpacksStart {
                cmd: adapter::start_command().to_string(),
            },
        };

        Ok(vec![
            adapter::descriptor("railway.json", adapter::to_json("railway.json", &railway)?, "json"),
            adapter::descriptor("nixpacks.toml", adapter::to_toml("nixpacks.toml", &nixpacks)?, "toml"),
            adapter::descriptor("Procfile", format!("web: {}\n", adapter::start_command()), "text"),
        ])
    }

    fn rollout_plan(&self, _options: &DeploymentOptions) -> Vec<RolloutStep> {
        vec![
            RolloutStep::new("Creating service", 1000),
            RolloutStep::new("Building with Nixpacks", 5000),
            RolloutStep::new("Provisioning environment variables", 800),
            RolloutStep::new("Starting container", 2500),
            RolloutStep::new("Running health checks", 1500),
        ]
    }

    fn deployment_url(&self, project: &GeneratedProject, options: &DeploymentOptions, _deployment_id: &str) -> String {
        adapter::public_url(
            options,
            format!(
                "https://{}-{}.up.railway.app",
                adapter::app_slug(project),
                options.environment
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::platforms::fixtures;
    use crate::ir::{DatabaseKind, Language};

    #[test]
    fn test_descriptor_set() {
        let project = fixtures::typescript();
        let options = DeploymentOptions::new(Platform::Railway);
        let files = RailwayAdapter.generate_deployment_files(&project, &options).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["railway.json", "nixpacks.toml", "Procfile"]);

        let config: serde_json::Value = serde_json::from_str(&files[0].content).unwrap();
        assert_eq!(config["deploy"]["region"], "us-west2");
        assert_eq!(config["deploy"]["preDeployCommand"], "npm run db:migrate");

        let nixpacks: toml::Value = toml::from_str(&files[1].content).unwrap();
        assert_eq!(nixpacks["start"]["cmd"].as_str(), Some("npm start"));
        assert!(nixpacks["phases"].get("build").is_some());
    }

    #[test]
    fn test_javascript_document_store_skips_build_and_migrate() {
        let project = fixtures::project(Language::Javascript, DatabaseKind::Mongodb);
        let options = DeploymentOptions::new(Platform::Railway);
        let files = RailwayAdapter.generate_deployment_files(&project, &options).unwrap();
        let config: serde_json::Value = serde_json::from_str(&files[0].content).unwrap();
        assert!(config["deploy"].get("preDeployCommand").is_none());
        let nixpacks: toml::Value = toml::from_str(&files[1].content).unwrap();
        assert!(nixpacks["phases"].get("build").is_none());
    }

    #[test]
    fn test_url_includes_environment() {
        let project = fixtures::typescript();
        let mut options = DeploymentOptions::new(Platform::Railway);
        options.environment = "staging".to_string();
        assert_eq!(
            RailwayAdapter.deployment_url(&project, &options, "abc"),
            "https://todo-service-staging.up.railway.app"
        );
    }
}
