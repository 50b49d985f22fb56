use serde_json::json;

use crate::deploy::adapter::{self, PlatformAdapter, RolloutStep};
use crate::deploy::{DeploymentOptions, Platform};
use crate::error::DeployError;
use crate::generator::writer::{CodeWriter, Lang};
use crate::ir::{Framework, GeneratedFile, GeneratedProject};

const REGIONS: &[&str] = &[
    "iad1", "sfo1", "pdx1", "cle1", "cdg1", "fra1", "lhr1", "arn1", "dub1", "hnd1", "icn1", "sin1",
    "syd1", "gru1", "bom1",
];

/// Serverless functions behind Vercel's edge network.
pub struct VercelAdapter;

impl VercelAdapter {
    fn entry(&self, project: &GeneratedProject) -> GeneratedFile {
        let lang = Lang(project.generation_options.language);
        let mut w = CodeWriter::new();
        match project.generation_options.framework {
            Framework::Express => {
                w.line(lang.import("{ createApp }", "../src/app"));
                w.blank();
                w.line("const app = createApp();");
                w.blank();
                w.line("export default app;");
            }
            Framework::Fastify => {
                w.line(lang.import("{ createApp }", "../src/app"));
                w.line(lang.import("{ connectDatabase }", "../src/config/database"));
                if lang.is_ts() {
                    w.line("import type { IncomingMessage, ServerResponse } from 'http';");
                }
                w.blank();
                w.line("const app = createApp();");
                w.line("const ready = connectDatabase().then(() => app.ready());");
                w.blank();
                w.block(
                    format!(
                        "export default async function handler(req{}, res{}) {{",
                        lang.annot("IncomingMessage"),
                        lang.annot("ServerResponse")
                    ),
                    "}",
                    |w| {
                        w.line("await ready;");
                        w.line("app.server.emit('request', req, res);");
                    },
                );
            }
        }
        GeneratedFile::new(
            format!("api/index.{}", lang.ext()),
            w.finish(),
            crate::ir::ArtifactKind::Source,
        )
        .with_language(project.generation_options.language.as_str())
    }
}

impl PlatformAdapter for VercelAdapter {
    fn platform(&self) -> Platform {
        Platform::Vercel
    }

    fn display_name(&self) -> &'static str {
        "Vercel"
    }

    fn optional_env(&self) -> &'static [&'static str] {
        &["VERCEL_ORG_ID", "VERCEL_PROJECT_ID", "VERCEL_TOKEN"]
    }

    fn regions(&self) -> &'static [&'static str] {
        REGIONS
    }

    fn generate_deployment_files(
        &self,
        project: &GeneratedProject,
        options: &DeploymentOptions,
    ) -> Result<Vec<GeneratedFile>, DeployError> {
        let ext = project.generation_options.language.ext();
        let entry = format!("api/index.{}", ext);
        let mut config = json!({
            "version": 2,
            "name": adapter::app_slug(project),
            "builds": [{ "src": entry, "use": "@vercel/node" }],
            "routes": [{ "src": "/(.*)", "dest": format!("/{}", entry) }],
            "regions": [self.region(options)],
            "env": { "NODE_ENV": options.environment },
        });
        if let Some(build) = adapter::build_command(project) {
            config["buildCommand"] = json!(build);
        }

        let ignore = ["node_modules", "tests", "coverage", ".env", "*.log"].join("\n") + "\n";

        Ok(vec![
            adapter::descriptor("vercel.json", adapter::to_json("vercel.json", &config)?, "json"),
            adapter::descriptor(".vercelignore", ignore, "text"),
            self.entry(project),
        ])
    }

    fn rollout_plan(&self, _options: &DeploymentOptions) -> Vec<RolloutStep> {
        vec![
            RolloutStep::new("Uploading source", 1500),
            RolloutStep::new("Installing dependencies", 3000),
            RolloutStep::new("Building serverless functions", 4000),
            RolloutStep::new("Deploying to edge network", 2500),
            RolloutStep::new("Assigning domain", 1000),
        ]
    }

    fn deployment_url(&self, project: &GeneratedProject, options: &DeploymentOptions, _deployment_id: &str) -> String {
        adapter::public_url(options, format!("https://{}.vercel.app", adapter::app_slug(project)))
    }
}
