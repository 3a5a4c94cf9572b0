use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A user-submitted description tracked through a single analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub description: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Task {
    pub fn new(id: String, description: String) -> Self {
        Self {
            id,
            description,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn start(&mut self) {
        self.status = TaskStatus::InProgress;
    }

    pub fn complete(&mut self, result: String) {
        self.status = TaskStatus::Completed;
        self.result = Some(result);
    }

    pub fn fail(&mut self, error: String) {
        self.status = TaskStatus::Failed;
        self.error = Some(error);
    }
}

/// Automation advice returned by the provider for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAnalysis {
    #[serde(default)]
    pub analysis: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub safe: bool,
    #[serde(default)]
    pub requires_confirmation: bool,
}

impl TaskAnalysis {
    /// Parse the provider's answer. Anything that is not a JSON object is kept
    /// verbatim as the analysis text and marked unsafe.
    pub fn from_response(raw: &str) -> Self {
        match serde_json::from_str::<TaskAnalysis>(raw.trim()) {
            Ok(analysis) => analysis,
            Err(_) => Self::unparsed(raw),
        }
    }

    pub fn unparsed(raw: &str) -> Self {
        Self {
            analysis: raw.to_string(),
            steps: Vec::new(),
            safe: false,
            requires_confirmation: true,
        }
    }

    /// Whether the analysis allows finishing the task without a human in the loop.
    pub fn allows_auto_complete(&self) -> bool {
        self.safe && !self.requires_confirmation
    }
}
