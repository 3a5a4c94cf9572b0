mod error;
mod python;
mod stats;

pub use error::{HostError, Result};
pub use python::{PythonRunner, TaskOutput};
pub use stats::{CpuStats, DiskStats, HostStats, MemoryStats, NetworkStats, OsStats, StatsSummary};
