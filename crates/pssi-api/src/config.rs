use anyhow::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Server settings. `PSSI_*` variables come through the config crate; the
/// unprefixed integration variables are read directly.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub provider_timeout_secs: u64,
    pub repo_path: PathBuf,
    pub tasks_dir: PathBuf,
    #[serde(skip)]
    pub github_token: Option<String>,
    #[serde(skip)]
    pub netlify_build_hook_url: Option<String>,
    #[serde(skip)]
    pub vercel_deploy_hook_url: Option<String>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Load from `vars` instead of the process environment when given.
    pub fn load(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000)?
            .set_default("provider_timeout_secs", 60)?
            .set_default("repo_path", ".")?
            .set_default("tasks_dir", "python/tasks")?
            .add_source(
                config::Environment::with_prefix("PSSI")
                    .try_parsing(true)
                    .source(vars.clone()),
            )
            .build()?;

        let mut api_config: ApiConfig = settings.try_deserialize()?;

        let lookup = |name: &str| -> Option<String> {
            let value = match &vars {
                Some(vars) => vars.get(name).cloned(),
                None => std::env::var(name).ok(),
            };
            value.filter(|v| !v.trim().is_empty())
        };

        api_config.github_token = lookup("GITHUB_TOKEN");
        api_config.netlify_build_hook_url = lookup("NETLIFY_BUILD_HOOK_URL");
        api_config.vercel_deploy_hook_url = lookup("VERCEL_DEPLOY_HOOK_URL");

        Ok(api_config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            provider_timeout_secs: 60,
            repo_path: PathBuf::from("."),
            tasks_dir: PathBuf::from("python/tasks"),
            github_token: None,
            netlify_build_hook_url: None,
            vercel_deploy_hook_url: None,
        }
    }
}
