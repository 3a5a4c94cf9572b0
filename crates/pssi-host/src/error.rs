use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Invalid task name: {0}")]
    InvalidTaskName(String),

    #[error("Task script not found: {0}")]
    TaskNotFound(String),

    #[error("Python task exited with code {code}: {stderr}")]
    TaskFailed { code: i32, stderr: String },

    #[error("Stats collection failed: {0}")]
    Collection(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, HostError>;
