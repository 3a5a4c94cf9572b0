use crate::repository::{GitHubRepo, RepoSummary, ScanReport};
use crate::Result;
use octocrab::Octocrab;

/// Repositories summarized per scan.
pub const SCAN_LIMIT: usize = 5;

#[derive(Clone)]
pub struct GitHubClient {
    client: Octocrab,
}

impl GitHubClient {
    /// Anonymous access is allowed; a token only raises rate limits.
    pub fn new(token: Option<String>) -> Result<Self> {
        let builder = Octocrab::builder();
        let client = match token.filter(|t| !t.trim().is_empty()) {
            Some(token) => builder.personal_token(token).build()?,
            None => builder.build()?,
        };

        Ok(Self { client })
    }

    /// List a user's public repositories
    pub async fn list_user_repos(&self, username: &str) -> Result<Vec<RepoSummary>> {
        tracing::info!("Listing repositories for {}", username);

        let repos: Vec<GitHubRepo> = self
            .client
            .get(
                format!("/users/{}/repos", username),
                Some(&[("per_page", "100")]),
            )
            .await?;

        Ok(repos
            .into_iter()
            .map(|r| RepoSummary::from_repo(r, username))
            .collect())
    }

    /// Get repository
    pub async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepoSummary> {
        tracing::info!("Fetching repository {}/{}", owner, repo);

        let repository: GitHubRepo = self
            .client
            .get(format!("/repos/{}/{}", owner, repo), None::<&()>)
            .await?;

        Ok(RepoSummary::from_repo(repository, owner))
    }

    /// Summarize the first few repositories of `username`.
    pub async fn scan_user(&self, username: &str) -> Result<ScanReport> {
        let repos = self.list_user_repos(username).await?;
        Ok(build_scan_report(username, repos))
    }
}

fn build_scan_report(username: &str, repos: Vec<RepoSummary>) -> ScanReport {
    let total_repos = repos.len();
    let scanned: Vec<RepoSummary> = repos.into_iter().take(SCAN_LIMIT).collect();

    ScanReport {
        username: username.to_string(),
        total_repos,
        scanned: scanned.len(),
        repos: scanned,
    }
}
