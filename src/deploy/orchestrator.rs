//! Runs simulated rollouts in the background and tracks their status.
//!
//! Each deployment gets one spawned task which is the only writer of its
//! status, published through a `watch` channel. The table itself only
//! stores handles, so reads never contend with a running rollout.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use super::status::step_progress;
use super::{
    DeploymentOptions, DeploymentState, DeploymentStatus, LogEntry, LogLevel, PlatformAdapter,
    PlatformRegistry,
};
use crate::config::DeployConfig;
use crate::error::DeployError;
use crate::generator::ValidationResult;
use crate::ir::{DeploymentConfig, GeneratedFile, GeneratedProject};

struct DeploymentHandle {
    status: watch::Receiver<DeploymentStatus>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct DeploymentOrchestrator {
    registry: PlatformRegistry,
    deployments: DashMap<String, DeploymentHandle>,
    settings: DeployConfig,
}

impl DeploymentOrchestrator {
    pub fn new(registry: PlatformRegistry, settings: DeployConfig) -> Self {
        Self {
            registry,
            deployments: DashMap::new(),
            settings,
        }
    }

    pub fn registry(&self) -> &PlatformRegistry {
        &self.registry
    }

    pub fn validate_config(&self, options: &DeploymentOptions) -> Result<ValidationResult, DeployError> {
        let adapter = self.registry.get(options.platform)?;
        Ok(adapter.validate_config(options))
    }

    pub fn generate_deployment_files(
        &self,
        project: &GeneratedProject,
        options: &DeploymentOptions,
    ) -> Result<Vec<GeneratedFile>, DeployError> {
        let adapter = self.registry.get(options.platform)?;
        let validation = adapter.validate_config(options);
        if !validation.is_valid {
            return Err(DeployError::InvalidConfig(validation));
        }
        adapter.generate_deployment_files(project, options)
    }

    /// The project with `options`' descriptor files added and its deployment
    /// staging recorded.
    pub fn stage(
        &self,
        project: &GeneratedProject,
        options: &DeploymentOptions,
    ) -> Result<GeneratedProject, DeployError> {
        let adapter = self.registry.get(options.platform)?;
        let descriptors = self.generate_deployment_files(project, options)?;
        let config = DeploymentConfig {
            platform: options.platform,
            region: adapter.region(options),
            environment: options.environment.clone(),
            descriptor_files: descriptors.iter().map(|f| f.path.clone()).collect(),
        };
        Ok(project.with_deployment(config, descriptors))
    }

    /// Validate `options` and start a rollout. Returns the initial
    /// `pending` snapshot; progress is observed with [`Self::get_status`].
    ///
    /// Must be called from within a Tokio runtime.
    pub fn deploy(
        &self,
        project: &GeneratedProject,
        options: DeploymentOptions,
    ) -> Result<DeploymentStatus, DeployError> {
        let adapter = self.registry.get(options.platform)?;
        let validation = adapter.validate_config(&options);
        if !validation.is_valid {
            return Err(DeployError::InvalidConfig(validation));
        }

        let id = Uuid::new_v4().to_string();
        let mut initial = DeploymentStatus::pending(&id, &project.id, options.platform);
        for warning in &validation.warnings {
            initial.append_log(LogLevel::Warn, warning.message.clone(), self.settings.max_log_entries);
        }

        let (tx, rx) = watch::channel(initial.clone());
        let cancel = CancellationToken::new();
        let rollout = Rollout {
            adapter,
            project: Arc::new(project.clone()),
            options,
            settings: self.settings.clone(),
            cancel: cancel.clone(),
            tx,
        };
        let task = tokio::spawn(rollout.run());

        info!(
            deployment_id = %id,
            project_id = %project.id,
            platform = %initial.platform,
            "Deployment queued"
        );

        self.deployments.insert(
            id,
            DeploymentHandle {
                status: rx,
                cancel,
                task,
            },
        );
        Ok(initial)
    }

    pub fn get_status(&self, id: &str) -> Result<DeploymentStatus, DeployError> {
        let handle = self
            .deployments
            .get(id)
            .ok_or_else(|| DeployError::NotFound(id.to_string()))?;
        let snapshot = handle.status.borrow().clone();
        Ok(snapshot)
    }

    pub fn get_logs(&self, id: &str) -> Result<Vec<LogEntry>, DeployError> {
        Ok(self.get_status(id)?.logs)
    }

    /// Request cancellation. Only a `deploying` rollout is affected; it stops
    /// at the next step boundary. Returns the current snapshot either way.
    pub fn cancel(&self, id: &str) -> Result<DeploymentStatus, DeployError> {
        let handle = self
            .deployments
            .get(id)
            .ok_or_else(|| DeployError::NotFound(id.to_string()))?;
        let snapshot = handle.status.borrow().clone();
        if snapshot.status == DeploymentState::Deploying {
            info!(deployment_id = %id, "Cancellation requested");
            handle.cancel.cancel();
        }
        Ok(snapshot)
    }

    /// Forget a deployment, stopping its rollout if it is still running.
    pub fn delete(&self, id: &str) -> Result<(), DeployError> {
        let (_, handle) = self
            .deployments
            .remove(id)
            .ok_or_else(|| DeployError::NotFound(id.to_string()))?;
        handle.cancel.cancel();
        handle.task.abort();
        info!(deployment_id = %id, "Deployment deleted");
        Ok(())
    }

    /// Snapshots of every tracked deployment, oldest first.
    pub fn list(&self) -> Vec<DeploymentStatus> {
        let mut all: Vec<DeploymentStatus> = self
            .deployments
            .iter()
            .map(|entry| entry.value().status.borrow().clone())
            .collect();
        all.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    pub fn subscribe(&self, id: &str) -> Result<watch::Receiver<DeploymentStatus>, DeployError> {
        self.deployments
            .get(id)
            .map(|handle| handle.status.clone())
            .ok_or_else(|| DeployError::NotFound(id.to_string()))
    }

    /// Resolves once the deployment reaches a terminal state, or with the
    /// last published snapshot if its rollout was aborted.
    pub async fn wait_for_completion(&self, id: &str) -> Result<DeploymentStatus, DeployError> {
        let mut rx = self.subscribe(id)?;
        let result = rx.wait_for(|s| s.is_terminal()).await.map(|s| s.clone());
        match result {
            Ok(status) => Ok(status),
            Err(_) => Ok(rx.borrow().clone()),
        }
    }
}

/// Everything one background rollout owns.
struct Rollout {
    adapter: Arc<dyn PlatformAdapter>,
    project: Arc<GeneratedProject>,
    options: DeploymentOptions,
    settings: DeployConfig,
    cancel: CancellationToken,
    tx: watch::Sender<DeploymentStatus>,
}

impl Rollout {
    async fn run(self) {
        let id = self.tx.borrow().id.clone();
        let deadline = self.settings.deadline();
        let max_logs = self.settings.max_log_entries;

        if tokio::time::timeout(deadline, self.steps(&id)).await.is_err() {
            warn!(deployment_id = %id, deadline_secs = self.settings.deadline_secs, "Deployment exceeded deadline");
            self.tx.send_modify(|s| {
                s.fail(
                    format!("Deployment exceeded the {}s deadline", self.settings.deadline_secs),
                    max_logs,
                );
            });
        }

        let last = self.tx.borrow();
        info!(
            deployment_id = %id,
            status = %last.status,
            progress = last.progress,
            "Deployment finished"
        );
    }

    async fn steps(&self, id: &str) {
        let max_logs = self.settings.max_log_entries;
        self.tx.send_modify(|s| {
            s.start(max_logs);
        });

        match self.adapter.generate_deployment_files(&self.project, &self.options) {
            Ok(files) => {
                let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
                self.tx.send_modify(|s| {
                    s.append_log(
                        LogLevel::Info,
                        format!("Generated deployment files: {}", paths.join(", ")),
                        max_logs,
                    );
                });
            }
            Err(e) => {
                warn!(deployment_id = %id, error = %e, "Failed to generate deployment files");
                self.tx.send_modify(|s| {
                    s.fail(e.to_string(), max_logs);
                });
                return;
            }
        }

        let plan = self.adapter.rollout_plan(&self.options);
        let total = plan.len();
        for (index, step) in plan.iter().enumerate() {
            if self.cancelled() {
                return;
            }
            self.tx.send_modify(|s| {
                s.message = step.name.clone();
                s.append_log(LogLevel::Info, format!("{}...", step.name), max_logs);
            });
            tokio::time::sleep(self.settings.scaled(step.duration)).await;
            self.tx.send_modify(|s| s.raise_progress(step_progress(index, total)));
        }

        if self.cancelled() {
            return;
        }

        let url = self.adapter.deployment_url(&self.project, &self.options, id);
        self.tx.send_modify(|s| {
            s.succeed(url, max_logs);
        });
    }

    /// Records `cancelled` if a cancel was requested.
    fn cancelled(&self) -> bool {
        if !self.cancel.is_cancelled() {
            return false;
        }
        let max_logs = self.settings.max_log_entries;
        self.tx.send_modify(|s| {
            s.cancel(max_logs);
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::platforms::fixtures;
    use crate::deploy::{Platform, RolloutStep};
    use crate::generator::IssueCode;
    use std::time::Duration;

    fn orchestrator(settings: DeployConfig) -> DeploymentOrchestrator {
        DeploymentOrchestrator::new(PlatformRegistry::with_defaults(), settings)
    }

    fn options(platform: Platform) -> DeploymentOptions {
        DeploymentOptions::new(platform)
            .with_env("DATABASE_URL", "postgres://db/todo")
            .with_env("JWT_SECRET", "s3cret")
    }

    #[tokio::test(start_paused = true)]
    async fn test_vercel_rollout_succeeds() {
        let orchestrator = orchestrator(DeployConfig::default());
        let project = fixtures::typescript();

        let initial = orchestrator.deploy(&project, options(Platform::Vercel)).unwrap();
        assert_eq!(initial.status, DeploymentState::Pending);
        assert_eq!(initial.progress, 0);
        assert_eq!(initial.project_id, project.id);

        let done = orchestrator.wait_for_completion(&initial.id).await.unwrap();
        assert_eq!(done.status, DeploymentState::Success);
        assert_eq!(done.progress, 100);
        assert_eq!(done.url.as_deref(), Some("https://todo-service.vercel.app"));
        assert!(done.completed_at.is_some());
        assert!(done.error.is_none());

        let logs = orchestrator.get_logs(&initial.id).unwrap();
        assert!(logs.iter().any(|l| l.message == "Deployment started"));
        assert!(logs.iter().any(|l| l.level == LogLevel::Warn && l.message.contains("VERCEL_TOKEN")));
        assert!(logs.iter().any(|l| l.message.starts_with("Generated deployment files: vercel.json")));
        assert!(logs.last().unwrap().message.contains("vercel.app"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_is_monotonic() {
        let orchestrator = orchestrator(DeployConfig::default());
        let project = fixtures::typescript();
        let initial = orchestrator.deploy(&project, options(Platform::Fly)).unwrap();
        let mut rx = orchestrator.subscribe(&initial.id).unwrap();

        let mut seen = vec![rx.borrow().progress];
        while rx.changed().await.is_ok() {
            let status = rx.borrow_and_update().clone();
            seen.push(status.progress);
            if status.is_terminal() {
                break;
            }
        }
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "progress went backwards: {:?}", seen);
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.iter().filter(|p| **p < 100).all(|p| *p <= 99));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_at_next_step() {
        let orchestrator = orchestrator(DeployConfig::default());
        let project = fixtures::typescript();
        let initial = orchestrator.deploy(&project, options(Platform::Vercel)).unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        let snapshot = orchestrator.cancel(&initial.id).unwrap();
        assert_eq!(snapshot.status, DeploymentState::Deploying);

        let done = orchestrator.wait_for_completion(&initial.id).await.unwrap();
        assert_eq!(done.status, DeploymentState::Cancelled);
        assert!(done.completed_at.is_some());
        assert!(done.url.is_none());
        assert_eq!(done.progress, 40);

        let again = orchestrator.cancel(&initial.id).unwrap();
        assert_eq!(again.status, DeploymentState::Cancelled);
        assert_eq!(again.completed_at, done.completed_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_pending_is_ignored() {
        let orchestrator = orchestrator(DeployConfig::default());
        let project = fixtures::typescript();
        let initial = orchestrator.deploy(&project, options(Platform::Heroku)).unwrap();

        let snapshot = orchestrator.cancel(&initial.id).unwrap();
        assert_eq!(snapshot.status, DeploymentState::Pending);

        let done = orchestrator.wait_for_completion(&initial.id).await.unwrap();
        assert_eq!(done.status, DeploymentState::Success);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_up_front() {
        let orchestrator = orchestrator(DeployConfig::default());
        let project = fixtures::typescript();
        let options = DeploymentOptions::new(Platform::Render).with_region("mars");

        match orchestrator.deploy(&project, options) {
            Err(DeployError::InvalidConfig(result)) => {
                assert!(result.has_error(IssueCode::MissingEnvVar));
                assert!(result.has_error(IssueCode::UnknownRegion));
            }
            other => panic!("expected invalid config, got {:?}", other.map(|s| s.status)),
        }
        assert!(orchestrator.list().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let orchestrator = orchestrator(DeployConfig::default());
        assert!(matches!(orchestrator.get_status("nope"), Err(DeployError::NotFound(_))));
        assert!(matches!(orchestrator.get_logs("nope"), Err(DeployError::NotFound(_))));
        assert!(matches!(orchestrator.cancel("nope"), Err(DeployError::NotFound(_))));
        assert!(matches!(orchestrator.delete("nope"), Err(DeployError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_purges_running_deployment() {
        let orchestrator = orchestrator(DeployConfig::default());
        let project = fixtures::typescript();
        let initial = orchestrator.deploy(&project, options(Platform::Aws)).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        orchestrator.delete(&initial.id).unwrap();
        assert!(matches!(orchestrator.get_status(&initial.id), Err(DeployError::NotFound(_))));
        assert!(orchestrator.list().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fails_rollout() {
        let settings = DeployConfig {
            deadline_secs: 5,
            ..DeployConfig::default()
        };
        let orchestrator = orchestrator(settings);
        let project = fixtures::typescript();
        let initial = orchestrator.deploy(&project, options(Platform::Railway)).unwrap();

        let done = orchestrator.wait_for_completion(&initial.id).await.unwrap();
        assert_eq!(done.status, DeploymentState::Failed);
        assert!(done.error.as_deref().unwrap().contains("deadline"));
        assert!(done.progress < 100);
    }

    #[tokio::test]
    async fn test_zero_time_scale_runs_immediately() {
        let settings = DeployConfig {
            time_scale: 0.0,
            ..DeployConfig::default()
        };
        let orchestrator = orchestrator(settings);
        let project = fixtures::typescript();
        let initial = orchestrator.deploy(&project, options(Platform::Render)).unwrap();
        let done = orchestrator.wait_for_completion(&initial.id).await.unwrap();
        assert_eq!(done.status, DeploymentState::Success);
        assert_eq!(done.url.as_deref(), Some("https://todo-service.onrender.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_is_ordered_by_start() {
        let orchestrator = orchestrator(DeployConfig::default());
        let project = fixtures::typescript();
        let first = orchestrator.deploy(&project, options(Platform::Vercel)).unwrap();
        let second = orchestrator.deploy(&project, options(Platform::Fly)).unwrap();

        let ids: Vec<String> = orchestrator.list().into_iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&first.id) && ids.contains(&second.id));
    }

    #[test]
    fn test_stage_records_descriptors() {
        let orchestrator = orchestrator(DeployConfig::default());
        let project = fixtures::typescript();
        let staged = orchestrator.stage(&project, &options(Platform::Fly)).unwrap();

        let deployment = staged.deployment.as_ref().unwrap();
        assert_eq!(deployment.platform, Platform::Fly);
        assert_eq!(deployment.region, "iad");
        assert_eq!(deployment.descriptor_files, vec!["fly.toml", "Dockerfile", ".dockerignore"]);
        assert!(staged.file("fly.toml").is_some());
        assert_eq!(staged.files.len(), project.files.len() + 3);

        let restaged = orchestrator.stage(&staged, &options(Platform::Vercel)).unwrap();
        assert!(restaged.file("fly.toml").is_none());
        assert!(restaged.file("vercel.json").is_some());
    }

    struct BrokenAdapter;

    impl PlatformAdapter for BrokenAdapter {
        fn platform(&self) -> Platform {
            Platform::Vercel
        }

        fn display_name(&self) -> &'static str {
            "Broken"
        }

        fn optional_env(&self) -> &'static [&'static str] {
            &[]
        }

        fn regions(&self) -> &'static [&'static str] {
            &["local"]
        }

        fn generate_deployment_files(
            &self,
            _project: &GeneratedProject,
            _options: &DeploymentOptions,
        ) -> Result<Vec<GeneratedFile>, DeployError> {
            Err(DeployError::Descriptor("vercel.json: template missing".to_string()))
        }

        fn rollout_plan(&self, _options: &DeploymentOptions) -> Vec<RolloutStep> {
            vec![RolloutStep::new("never runs", 1000)]
        }

        fn deployment_url(&self, _: &GeneratedProject, _: &DeploymentOptions, _: &str) -> String {
            String::new()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_descriptor_failure_marks_failed() {
        let mut registry = PlatformRegistry::new();
        registry.register(Arc::new(BrokenAdapter));
        let orchestrator = DeploymentOrchestrator::new(registry, DeployConfig::default());
        let project = fixtures::typescript();

        let initial = orchestrator.deploy(&project, options(Platform::Vercel)).unwrap();
        let done = orchestrator.wait_for_completion(&initial.id).await.unwrap();
        assert_eq!(done.status, DeploymentState::Failed);
        assert!(done.error.as_deref().unwrap().contains("template missing"));
        assert_eq!(done.progress, 0);
    }
}
