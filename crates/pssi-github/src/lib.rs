pub mod client;
pub mod error;
pub mod healer;
pub mod repository;

// Re-exports
pub use client::GitHubClient;
pub use error::{Error, Result};
pub use healer::{HealAction, HealReport, RepoHealer};
pub use repository::{RepoSummary, ScanReport};
