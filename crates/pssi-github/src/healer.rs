use crate::{Error, Result};
use chrono::{DateTime, Utc};
use git2::{ErrorCode, Repository, Status, StatusOptions};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealAction {
    Check,
    Fix,
}

impl std::str::FromStr for HealAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "check" => Ok(HealAction::Check),
            "fix" => Ok(HealAction::Fix),
            other => Err(Error::InvalidAction(other.to_string())),
        }
    }
}

/// Outcome of a heal action. Failures are reported in-band.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealReport {
    pub status: String,
    pub action: HealAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_changes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl HealReport {
    fn failed(action: HealAction, error: impl std::fmt::Display) -> Self {
        Self {
            status: "error".to_string(),
            action,
            branch: None,
            has_changes: None,
            changes: None,
            message: None,
            error: Some(error.to_string()),
            timestamp: None,
        }
    }
}

/// Working-tree health of one local repository.
pub struct RepoHealer {
    path: PathBuf,
}

impl RepoHealer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn run(&self, action: HealAction) -> HealReport {
        match action {
            HealAction::Check => self.check(),
            HealAction::Fix => self.fix(),
        }
    }

    /// Current branch plus a porcelain-style list of uncommitted changes.
    pub fn check(&self) -> HealReport {
        match self.inspect() {
            Ok((branch, changes)) => HealReport {
                status: "success".to_string(),
                action: HealAction::Check,
                branch: Some(branch),
                has_changes: Some(!changes.is_empty()),
                changes: Some(changes),
                message: None,
                error: None,
                timestamp: Some(Utc::now()),
            },
            Err(e) => {
                tracing::error!("Repository check failed for {:?}: {}", self.path, e);
                HealReport::failed(HealAction::Check, e)
            }
        }
    }

    /// Reports what would be repaired; the repository is left untouched.
    pub fn fix(&self) -> HealReport {
        HealReport {
            status: "success".to_string(),
            action: HealAction::Fix,
            branch: None,
            has_changes: None,
            changes: None,
            message: Some("Repo healing logic would be implemented here".to_string()),
            error: None,
            timestamp: Some(Utc::now()),
        }
    }

    fn inspect(&self) -> Result<(String, Vec<String>)> {
        let repo = Repository::discover(&self.path)?;
        let branch = current_branch(&repo)?;

        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = repo.statuses(Some(&mut options))?;
        let changes = statuses
            .iter()
            .filter_map(|entry| {
                let path = entry.path()?.to_string();
                porcelain_code(entry.status()).map(|code| format!("{} {}", code, path))
            })
            .collect();

        Ok((branch, changes))
    }
}

/// Branch name, including the not-yet-born branch of an empty repository.
fn current_branch(repo: &Repository) -> Result<String> {
    match repo.head() {
        Ok(head) => Ok(head.shorthand().unwrap_or("HEAD").to_string()),
        Err(e) if e.code() == ErrorCode::UnbornBranch => {
            let head = repo.find_reference("HEAD")?;
            let target = head.symbolic_target().unwrap_or("HEAD");
            Ok(target.trim_start_matches("refs/heads/").to_string())
        }
        Err(e) => Err(e.into()),
    }
}

/// Two-letter `git status --porcelain` code, `None` for clean entries.
fn porcelain_code(status: Status) -> Option<String> {
    if status.is_ignored() || status == Status::CURRENT {
        return None;
    }
    if status.is_wt_new() && !status.intersects(index_flags()) {
        return Some("??".to_string());
    }
    if status.is_conflicted() {
        return Some("UU".to_string());
    }

    let index = if status.is_index_new() {
        'A'
    } else if status.is_index_modified() {
        'M'
    } else if status.is_index_deleted() {
        'D'
    } else if status.is_index_renamed() {
        'R'
    } else if status.is_index_typechange() {
        'T'
    } else {
        ' '
    };

    let worktree = if status.is_wt_modified() {
        'M'
    } else if status.is_wt_deleted() {
        'D'
    } else if status.is_wt_renamed() {
        'R'
    } else if status.is_wt_typechange() {
        'T'
    } else {
        ' '
    };

    Some(format!("{}{}", index, worktree))
}

fn index_flags() -> Status {
    Status::INDEX_NEW
        | Status::INDEX_MODIFIED
        | Status::INDEX_DELETED
        | Status::INDEX_RENAMED
        | Status::INDEX_TYPECHANGE
}
