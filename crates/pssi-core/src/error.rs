use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task description is required")]
    EmptyDescription,

    #[error("Task analysis failed: {0}")]
    AnalysisFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
