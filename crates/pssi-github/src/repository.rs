use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository as returned by the GitHub REST API, trimmed to what is summarized.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    pub full_name: Option<String>,
    pub owner: Option<GitHubOwner>,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub open_issues_count: u32,
    pub default_branch: Option<String>,
    pub html_url: Option<String>,
    pub pushed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubOwner {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSummary {
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub language: Option<String>,
    pub stars: u32,
    pub open_issues: u32,
    pub default_branch: String,
    pub html_url: String,
    pub pages_url: String,
    pub pushed_at: Option<DateTime<Utc>>,
}

impl RepoSummary {
    /// Summarize `repo`, using `fallback_owner` when the payload has no owner.
    pub fn from_repo(repo: GitHubRepo, fallback_owner: &str) -> Self {
        let owner = repo
            .owner
            .map(|o| o.login)
            .unwrap_or_else(|| fallback_owner.to_string());
        let full_name = repo
            .full_name
            .unwrap_or_else(|| format!("{}/{}", owner, repo.name));
        let html_url = repo
            .html_url
            .unwrap_or_else(|| format!("https://github.com/{}", full_name));

        Self {
            pages_url: pages_url(&owner, &repo.name),
            owner,
            name: repo.name,
            full_name,
            language: repo.language,
            stars: repo.stargazers_count,
            open_issues: repo.open_issues_count,
            default_branch: repo.default_branch.unwrap_or_else(|| "main".to_string()),
            html_url,
            pushed_at: repo.pushed_at,
        }
    }
}

pub fn pages_url(owner: &str, name: &str) -> String {
    format!("https://{}.github.io/{}", owner.to_lowercase(), name)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub username: String,
    pub total_repos: usize,
    pub scanned: usize,
    pub repos: Vec<RepoSummary>,
}
