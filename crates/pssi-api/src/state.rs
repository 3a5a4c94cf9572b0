use crate::config::ApiConfig;
use crate::handlers::deploy::DeployHooks;
use anyhow::Result;
use pssi_ai::Gateway;
use pssi_core::TaskRegistry;
use pssi_github::{GitHubClient, RepoHealer};
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiState {
    pub gateway: Arc<dyn Gateway>,
    pub registry: TaskRegistry,
    pub github_client: Arc<GitHubClient>,
    pub healer: Arc<RepoHealer>,
    pub deploy_hooks: Arc<DeployHooks>,
    pub http: reqwest::Client,
}

impl ApiState {
    pub fn new(config: &ApiConfig, gateway: Arc<dyn Gateway>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.provider_timeout())
            .build()?;

        Ok(Self {
            gateway,
            registry: TaskRegistry::new(),
            github_client: Arc::new(GitHubClient::new(config.github_token.clone())?),
            healer: Arc::new(RepoHealer::new(config.repo_path.clone())),
            deploy_hooks: Arc::new(DeployHooks {
                netlify: config.netlify_build_hook_url.clone(),
                vercel: config.vercel_deploy_hook_url.clone(),
            }),
            http,
        })
    }
}
