use serde_json::json;

use crate::deploy::adapter::{self, PlatformAdapter, RolloutStep};
use crate::deploy::{DeploymentOptions, Platform};
use crate::error::DeployError;
use crate::generator::naming;
use crate::ir::{GeneratedFile, GeneratedProject};

const REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "eu-west-1",
    "eu-central-1",
    "ap-southeast-1",
    "ap-northeast-1",
    "ap-south-1",
    "sa-east-1",
];

const LAMBDA_ADAPTER: &str =
    "COPY --from=public.ecr.aws/awsguru/aws-lambda-adapter:0.8.4 /lambda-adapter /opt/extensions/lambda-adapter";

/// Container image Lambda behind an HTTP API, built by CodeBuild.
pub struct AwsAdapter;

impl PlatformAdapter for AwsAdapter {
    fn platform(&self) -> Platform {
        Platform::Aws
    }

    fn display_name(&self) -> &'static str {
        "AWS Lambda"
    }

    fn optional_env(&self) -> &'static [&'static str] {
        &["AWS_ACCOUNT_ID", "AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"]
    }

    fn regions(&self) -> &'static [&'static str] {
        REGIONS
    }

    fn generate_deployment_files(
        &self,
        project: &GeneratedProject,
        options: &DeploymentOptions,
    ) -> Result<Vec<GeneratedFile>, DeployError> {
        let function = format!("{}Function", naming::pascal(&project.name));
        let repository = adapter::app_slug(project);

        let mut variables = json!({
            "NODE_ENV": options.environment,
            "PORT": "3000",
            "DATABASE_URL": { "Ref": "DatabaseUrl" },
        });
        if adapter::uses_tokens(project) {
            variables["JWT_SECRET"] = json!({ "Ref": "JwtSecret" });
        }

        let mut parameters = json!({
            "DatabaseUrl": { "Type": "String", "NoEcho": true },
        });
        if adapter::uses_tokens(project) {
            parameters["JwtSecret"] = json!({ "Type": "String", "NoEcho": true });
        }

        let mut resources = serde_json::Map::new();
        resources.insert(
            function.clone(),
            json!({
                "Type": "AWS::Serverless::Function",
                "Properties": {
                    "PackageType": "Image",
                    "Environment": { "Variables": variables },
                    "Events": {
                        "Api": {
                            "Type": "HttpApi",
                            "Properties": { "Path": "/{proxy+}", "Method": "ANY" },
                        },
                    },
                },
                "Metadata": {
                    "Dockerfile": "Dockerfile",
                    "DockerContext": ".",
                    "DockerTag": options.environment,
                },
            }),
        );

        let template = json!({
            "AWSTemplateFormatVersion": "2010-09-09",
            "Transform": "AWS::Serverless-2016-10-31",
            "Description": format!("{} API ({})", project.name, options.environment),
            "Parameters": parameters,
            "Globals": { "Function": { "Timeout": 30, "MemorySize": 512 } },
            "Resources": resources,
            "Outputs": {
                "ApiUrl": {
                    "Description": "HTTP API endpoint",
                    "Value": {
                        "Fn::Sub": "https://${ServerlessHttpApi}.execute-api.${AWS::Region}.amazonaws.com/",
                    },
                },
                "FunctionArn": {
                    "Value": { "Fn::GetAtt": [function, "Arn"] },
                },
            },
        });

        let region = self.region(options);
        let buildspec = json!({
            "version": 0.2,
            "env": {
                "variables": {
                    "AWS_REGION": region,
                    "IMAGE_REPO": repository,
                },
            },
            "phases": {
                "install": { "runtime-versions": { "nodejs": 20 } },
                "pre_build": {
                    "commands": [
                        "aws ecr get-login-password --region $AWS_REGION | docker login --username AWS --password-stdin $AWS_ACCOUNT_ID.dkr.ecr.$AWS_REGION.amazonaws.com",
                    ],
                },
                "build": {
                    "commands": [
                        "sam build",
                        format!(
                            "sam deploy --stack-name {}-{} --region $AWS_REGION --resolve-image-repos --capabilities CAPABILITY_IAM --no-confirm-changeset --no-fail-on-empty-changeset",
                            repository, options.environment
                        ),
                    ],
                },
            },
        });

        Ok(vec![
            adapter::descriptor("template.yaml", adapter::to_yaml("template.yaml", &template)?, "yaml"),
            adapter::descriptor("buildspec.yml", adapter::to_yaml("buildspec.yml", &buildspec)?, "yaml"),
            adapter::descriptor(
                "Dockerfile",
                adapter::dockerfile(project, &[LAMBDA_ADAPTER, "ENV AWS_LWA_READINESS_CHECK_PATH=/health"]),
                "dockerfile",
            ),
        ])
    }

    fn rollout_plan(&self, _options: &DeploymentOptions) -> Vec<RolloutStep> {
        vec![
            RolloutStep::new("Packaging container image", 4000),
            RolloutStep::new("Pushing image to ECR", 3000),
            RolloutStep::new("Creating CloudFormation changeset", 2000),
            RolloutStep::new("Executing changeset", 6000),
            RolloutStep::new("Configuring API Gateway", 2000),
        ]
    }

    fn deployment_url(&self, _project: &GeneratedProject, options: &DeploymentOptions, deployment_id: &str) -> String {
        adapter::public_url(
            options,
            format!(
                "https://{}.execute-api.{}.amazonaws.com/{}",
                adapter::short_id(deployment_id),
                self.region(options),
                options.environment
            ),
        )
    }
}
