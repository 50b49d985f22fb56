//! Simulated rollouts across every platform through the public API.

use stackforge::config::DeployConfig;
use stackforge::deploy::{
    DeploymentOptions, DeploymentOrchestrator, DeploymentState, Platform, PlatformRegistry,
};
use stackforge::error::DeployError;
use stackforge::generator::{generate_project, ProjectInput};
use stackforge::ir::{Field, FieldType, GeneratedProject, Model};

fn project() -> GeneratedProject {
    let product = Model::new("Product")
        .with_field(Field::new("sku", FieldType::String).required().unique())
        .with_field(Field::new("price", FieldType::Decimal).required());
    generate_project(&ProjectInput::new("Storefront", vec![product])).unwrap()
}

fn instant() -> DeployConfig {
    DeployConfig {
        time_scale: 0.0,
        ..DeployConfig::default()
    }
}

fn options(platform: Platform) -> DeploymentOptions {
    DeploymentOptions::new(platform).with_env("DATABASE_URL", "postgres://db/storefront")
}

#[tokio::test]
async fn every_platform_deploys_successfully() {
    let orchestrator = DeploymentOrchestrator::new(PlatformRegistry::with_defaults(), instant());
    let project = project();

    for platform in Platform::ALL {
        let initial = orchestrator.deploy(&project, options(platform)).unwrap();
        assert_eq!(initial.status, DeploymentState::Pending);

        let done = orchestrator.wait_for_completion(&initial.id).await.unwrap();
        assert_eq!(done.status, DeploymentState::Success, "{} did not succeed", platform);
        assert_eq!(done.progress, 100);
        let url = done.url.unwrap();
        assert!(url.starts_with("https://"), "{}: {}", platform, url);
    }
    assert_eq!(orchestrator.list().len(), Platform::ALL.len());
}

#[tokio::test]
async fn custom_domain_overrides_platform_url() {
    let orchestrator = DeploymentOrchestrator::new(PlatformRegistry::with_defaults(), instant());
    let project = project();
    let initial = orchestrator
        .deploy(&project, options(Platform::Render).with_domain("api.storefront.dev"))
        .unwrap();
    let done = orchestrator.wait_for_completion(&initial.id).await.unwrap();
    assert_eq!(done.url.as_deref(), Some("https://api.storefront.dev"));
}

#[tokio::test(start_paused = true)]
async fn cancelled_deployment_stays_cancelled() {
    let orchestrator =
        DeploymentOrchestrator::new(PlatformRegistry::with_defaults(), DeployConfig::default());
    let project = project();
    let initial = orchestrator.deploy(&project, options(Platform::Aws)).unwrap();

    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
    orchestrator.cancel(&initial.id).unwrap();
    let done = orchestrator.wait_for_completion(&initial.id).await.unwrap();
    assert_eq!(done.status, DeploymentState::Cancelled);

    let after = orchestrator.cancel(&initial.id).unwrap();
    assert_eq!(after, done);
}

#[tokio::test]
async fn unknown_platform_region_is_a_config_error() {
    let orchestrator = DeploymentOrchestrator::new(PlatformRegistry::with_defaults(), instant());
    let result = orchestrator.deploy(&project(), options(Platform::Heroku).with_region("ap"));
    assert!(matches!(result, Err(DeployError::InvalidConfig(_))));
}
