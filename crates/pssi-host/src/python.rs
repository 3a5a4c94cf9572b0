use crate::error::{HostError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs named scripts from the tasks directory with a Python interpreter.
#[derive(Debug, Clone)]
pub struct PythonRunner {
    interpreter: String,
    tasks_dir: PathBuf,
}

impl PythonRunner {
    pub fn new(tasks_dir: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: "python3".to_string(),
            tasks_dir: tasks_dir.into(),
        }
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn tasks_dir(&self) -> &Path {
        &self.tasks_dir
    }

    /// Resolve `<tasks_dir>/<name>.py`; names cannot leave the directory.
    pub fn script_path(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(HostError::InvalidTaskName(name.to_string()));
        }
        Ok(self.tasks_dir.join(format!("{}.py", name)))
    }

    pub async fn run(&self, name: &str, args: &[String]) -> Result<TaskOutput> {
        let script = self.script_path(name)?;
        if !script.is_file() {
            return Err(HostError::TaskNotFound(script.display().to_string()));
        }

        info!("Running Python task {} with {} args", name, args.len());
        debug!("Script path: {:?}", script);

        let output = Command::new(&self.interpreter)
            .arg(&script)
            .args(args)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(HostError::TaskFailed {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        info!("Python task {} finished", name);
        Ok(TaskOutput { stdout, stderr })
    }
}
