use crate::provider::ProviderKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("{0} is not configured. Please add API key.")]
    NotConfigured(ProviderKind),

    #[error("{message}")]
    Provider {
        provider: ProviderKind,
        status: u16,
        message: String,
    },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Upstream HTTP status, when the provider answered at all.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Error::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
