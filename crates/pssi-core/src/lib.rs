pub mod task;
pub mod registry;
pub mod error;

// Re-exports
pub use task::{Task, TaskAnalysis, TaskStatus};
pub use registry::{RegistryStatistics, TaskAnalyzer, TaskRegistry};
pub use error::{Error, Result};
