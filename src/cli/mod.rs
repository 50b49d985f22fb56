//! Command-line interface.
//!
//! Subcommands run the pipeline locally, without a server:
//! - `serve` - Start the HTTP API (default)
//! - `validate` - Validate a project input file
//! - `generate` - Write a generated project to disk
//! - `deploy` - Run a simulated rollout and print its progress
//! - `platforms` - List deployment targets

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Component, Path, PathBuf};

use crate::config::Config;
use crate::deploy::{
    DeploymentOptions, DeploymentOrchestrator, DeploymentState, Platform, PlatformRegistry,
};
use crate::generator::{generate_project, ProjectRequest, ValidationResult};
use crate::ir::GeneratedFile;

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "stackforge")]
#[command(author, version, about = "Generate backend projects and simulate their deployment", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "STACKFORGE_CONFIG", default_value = "stackforge.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Deployment target flags shared by `generate` and `deploy`
#[derive(clap::Args, Debug, Clone)]
pub struct TargetArgs {
    /// Platform region (defaults to the platform's first region)
    #[arg(long)]
    pub region: Option<String>,

    /// Deployment environment
    #[arg(long, default_value = "production")]
    pub environment: String,

    /// Environment variable for the deployment, as KEY=VALUE (repeatable)
    #[arg(long = "env", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Custom domain
    #[arg(long)]
    pub domain: Option<String>,
}

impl TargetArgs {
    pub fn options(&self, platform: Platform) -> DeploymentOptions {
        let mut options = DeploymentOptions::new(platform);
        options.region = self.region.clone();
        options.environment = self.environment.clone();
        options.custom_domain = self.domain.clone();
        options.environment_variables = self.env.iter().cloned().collect();
        options
    }
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve,

    /// Validate a project input file (JSON or YAML)
    Validate {
        /// Project input file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Generate a project and write its files
    Generate {
        /// Project input file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Also write deployment descriptors for this platform
        #[arg(short, long)]
        platform: Option<Platform>,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Generate a project and run a simulated deployment
    Deploy {
        /// Project input file
        #[arg(short, long)]
        input: PathBuf,

        /// Target platform
        #[arg(short, long)]
        platform: Platform,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// List supported deployment platforms
    Platforms,
}

fn parse_env_pair(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("missing variable name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Run a CLI command. `serve` and no subcommand are handled in main.rs.
pub async fn run_command(cli: &Cli, config: &Config) -> Result<()> {
    match &cli.command {
        Some(Commands::Validate { input }) => cmd_validate(config, input),
        Some(Commands::Generate {
            input,
            out,
            platform,
            target,
        }) => cmd_generate(config, input, out, *platform, target),
        Some(Commands::Deploy {
            input,
            platform,
            target,
        }) => cmd_deploy(config, input, *platform, target).await,
        Some(Commands::Platforms) => cmd_platforms(),
        Some(Commands::Serve) | None => Ok(()),
    }
}

/// Read a project request; `.yaml`/`.yml` files are parsed as YAML, anything else as JSON.
pub fn load_request(path: &Path) -> Result<ProjectRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read project input: {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML project input: {}", path.display()))
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON project input: {}", path.display()))
    }
}

fn print_issues(result: &ValidationResult) {
    for issue in &result.errors {
        println!("  [error]   {}: {} ({})", issue.field, issue.message, issue.code);
    }
    for issue in &result.warnings {
        println!("  [warning] {}: {} ({})", issue.field, issue.message, issue.code);
    }
}

fn cmd_validate(config: &Config, input: &Path) -> Result<()> {
    let input = load_request(input)?.into_input(&config.generation);
    let result = input.validate();

    print_issues(&result);
    if !result.is_valid {
        anyhow::bail!("Validation failed with {} error(s)", result.errors.len());
    }
    println!(
        "'{}' is valid ({} model(s), {} warning(s))",
        input.name,
        input.models.len(),
        result.warnings.len()
    );
    Ok(())
}

fn cmd_generate(
    config: &Config,
    input: &Path,
    out: &Path,
    platform: Option<Platform>,
    target: &TargetArgs,
) -> Result<()> {
    let input = load_request(input)?.into_input(&config.generation);
    let mut project = match generate_project(&input) {
        Ok(project) => project,
        Err(crate::error::GenerationError::InvalidModels(result)) => {
            print_issues(&result);
            anyhow::bail!("Validation failed with {} error(s)", result.errors.len());
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(platform) = platform {
        let orchestrator = orchestrator(config);
        let options = target.options(platform);
        project = match orchestrator.stage(&project, &options) {
            Ok(staged) => staged,
            Err(crate::error::DeployError::InvalidConfig(result)) => {
                print_issues(&result);
                anyhow::bail!("Deployment configuration for {} is invalid", platform);
            }
            Err(e) => return Err(e.into()),
        };
    }

    write_files(out, &project.files)?;
    println!(
        "Generated '{}' ({}) with {} files and {} endpoints in {}",
        project.name,
        project.id,
        project.files.len(),
        project.endpoints.len(),
        out.display()
    );
    Ok(())
}

/// Write every file under `root`, creating directories as needed. Paths that
/// would escape `root` are rejected.
pub fn write_files(root: &Path, files: &[GeneratedFile]) -> Result<()> {
    for file in files {
        let relative = Path::new(&file.path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            anyhow::bail!("Refusing to write outside the output directory: {}", file.path);
        }

        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(&path, &file.content)
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
    }
    Ok(())
}

fn orchestrator(config: &Config) -> DeploymentOrchestrator {
    DeploymentOrchestrator::new(PlatformRegistry::with_defaults(), config.deploy.clone())
}

async fn cmd_deploy(config: &Config, input: &Path, platform: Platform, target: &TargetArgs) -> Result<()> {
    let input = load_request(input)?.into_input(&config.generation);
    let project = generate_project(&input)?;
    let orchestrator = orchestrator(config);

    let initial = match orchestrator.deploy(&project, target.options(platform)) {
        Ok(status) => status,
        Err(crate::error::DeployError::InvalidConfig(result)) => {
            print_issues(&result);
            anyhow::bail!("Deployment configuration for {} is invalid", platform);
        }
        Err(e) => return Err(e.into()),
    };
    println!("Deployment {} queued on {}", initial.id, platform);

    let mut rx = orchestrator.subscribe(&initial.id)?;
    let mut printed = 0;
    loop {
        let status = rx.borrow_and_update().clone();
        for entry in status.logs.iter().skip(printed) {
            println!("[{:>3}%] {}", status.progress, entry.message);
        }
        printed = status.logs.len();
        if status.is_terminal() || rx.changed().await.is_err() {
            break;
        }
    }

    let done = orchestrator.wait_for_completion(&initial.id).await?;
    match done.status {
        DeploymentState::Success => {
            println!();
            println!("Deployed: {}", done.url.as_deref().unwrap_or("-"));
            Ok(())
        }
        DeploymentState::Cancelled => anyhow::bail!("Deployment was cancelled"),
        _ => anyhow::bail!(
            "Deployment failed: {}",
            done.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

fn cmd_platforms() -> Result<()> {
    let registry = PlatformRegistry::with_defaults();

    println!();
    println!("{:<10}  {:<12}  {:<16}  {}", "PLATFORM", "NAME", "DEFAULT REGION", "OPTIONAL ENV");
    println!("{}", "-".repeat(90));
    for adapter in registry.list() {
        println!(
            "{:<10}  {:<12}  {:<16}  {}",
            adapter.platform(),
            adapter.display_name(),
            adapter.default_region(),
            adapter.optional_env().join(", ")
        );
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ArtifactKind;

    #[test]
    fn test_parse_env_pair() {
        assert_eq!(
            parse_env_pair("DATABASE_URL=postgres://u:p@h/db?x=1").unwrap(),
            ("DATABASE_URL".to_string(), "postgres://u:p@h/db?x=1".to_string())
        );
        assert!(parse_env_pair("NOVALUE").is_err());
        assert!(parse_env_pair("=x").is_err());
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "stackforge",
            "deploy",
            "--input",
            "shop.json",
            "--platform",
            "fly",
            "--env",
            "DATABASE_URL=postgres://db",
            "--region",
            "ams",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Deploy { platform, target, .. }) => {
                assert_eq!(platform, Platform::Fly);
                let options = target.options(platform);
                assert_eq!(options.region.as_deref(), Some("ams"));
                assert_eq!(options.environment, "production");
                assert_eq!(options.environment_variables["DATABASE_URL"], "postgres://db");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_write_files_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            GeneratedFile::new("package.json", "{}", ArtifactKind::Config),
            GeneratedFile::new("src/models/user.ts", "export {};", ArtifactKind::Source),
        ];
        write_files(dir.path(), &files).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("src/models/user.ts")).unwrap(),
            "export {};"
        );
    }

    #[test]
    fn test_write_files_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![GeneratedFile::new("../evil.sh", "", ArtifactKind::Source)];
        assert!(write_files(dir.path(), &files).is_err());
        let files = vec![GeneratedFile::new("/etc/passwd", "", ArtifactKind::Source)];
        assert!(write_files(dir.path(), &files).is_err());
    }

    #[test]
    fn test_load_yaml_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.yaml");
        std::fs::write(&path, "name: Shop\nmodels:\n  - name: Product\n    fields: []\n").unwrap();
        let request = load_request(&path).unwrap();
        assert_eq!(request.name, "Shop");
        assert_eq!(request.models[0].name, "Product");
    }
}
