use aws_sdk_s3::Client as S3Client;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::versioning::VersioningWorkflow;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Save / preview / revert over the configured version store.
    pub workflow: VersioningWorkflow,
    /// Original resume uploads.
    pub s3: S3Client,
    pub llm: LlmClient,
    pub config: Config,
}

#[cfg(test)]
impl AppState {
    /// In-memory store; S3 and LLM clients pointed at `config`'s endpoints.
    pub fn for_tests(config: Config) -> Self {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
        use std::sync::Arc;

        use crate::versioning::MemoryVersionStore;

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "tests"))
            .endpoint_url(&config.s3_endpoint)
            .force_path_style(true)
            .build();

        AppState {
            workflow: VersioningWorkflow::new(Arc::new(MemoryVersionStore::new())),
            s3: S3Client::from_conf(s3_config),
            llm: LlmClient::new(config.anthropic_api_key.clone(), config.llm_api_url.clone()),
            config,
        }
    }
}
