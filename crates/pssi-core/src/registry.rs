use crate::{Error, Result, Task, TaskAnalysis, TaskStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Produces automation advice for a task description.
#[async_trait]
pub trait TaskAnalyzer: Send + Sync {
    async fn analyze(&self, description: &str) -> Result<TaskAnalysis>;
}

/// In-process store of submitted tasks.
///
/// Created once per process and handed to whoever needs it; clones share the
/// same underlying map. Nothing is evicted or persisted.
#[derive(Clone)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<String, Task>>>,
    last_id: Arc<AtomicI64>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            last_id: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Submit a task for analysis.
    ///
    /// The task is stored as pending and moved to in progress before it is
    /// analyzed once. It only reaches completed when `auto_execute` is set and the analysis
    /// says the task is safe without confirmation; the result is a placeholder
    /// because nothing is actually executed.
    pub async fn submit(
        &self,
        description: String,
        auto_execute: bool,
        analyzer: &dyn TaskAnalyzer,
    ) -> Result<(Task, TaskAnalysis)> {
        if description.trim().is_empty() {
            return Err(Error::EmptyDescription);
        }

        let task = Task::new(self.next_id(), description);
        let task_id = task.id.clone();

        self.tasks.write().await.insert(task_id.clone(), task.clone());
        tracing::info!("Created task: {}", task_id);

        self.update(&task_id, Task::start).await?;

        let analysis = match analyzer.analyze(&task.description).await {
            Ok(analysis) => analysis,
            Err(e) => {
                self.update(&task_id, |t| t.fail(e.to_string())).await?;
                tracing::error!("Task {} failed: {}", task_id, e);
                return Err(e);
            }
        };

        let task = self
            .update(&task_id, |t| {
                if auto_execute && analysis.allows_auto_complete() {
                    t.complete(format!("Task analyzed: {}", analysis.analysis));
                }
            })
            .await?;

        tracing::info!("Task {} is {}", task.id, task.status);

        Ok((task, analysis))
    }

    /// Get task by ID
    pub async fn get(&self, task_id: &str) -> Result<Task> {
        let tasks = self.tasks.read().await;
        tasks
            .get(task_id)
            .cloned()
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))
    }

    /// List all tasks, oldest first
    pub async fn list(&self) -> Vec<Task> {
        let tasks = self.tasks.read().await;
        let mut all: Vec<Task> = tasks.values().cloned().collect();
        all.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        all
    }

    pub async fn get_statistics(&self) -> RegistryStatistics {
        let tasks = self.tasks.read().await;
        let count = |status: TaskStatus| tasks.values().filter(|t| t.status == status).count();

        RegistryStatistics {
            total_tasks: tasks.len(),
            pending_tasks: count(TaskStatus::Pending),
            in_progress_tasks: count(TaskStatus::InProgress),
            completed_tasks: count(TaskStatus::Completed),
            failed_tasks: count(TaskStatus::Failed),
        }
    }

    async fn update<F>(&self, task_id: &str, apply: F) -> Result<Task>
    where
        F: FnOnce(&mut Task),
    {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;
        apply(task);
        Ok(task.clone())
    }

    /// `task_<millis>`, bumped past the last issued value so two submissions in
    /// the same millisecond never share an id.
    fn next_id(&self) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        let mut last = self.last_id.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(last + 1);
            match self
                .last_id
                .compare_exchange(last, candidate, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return format!("task_{}", candidate),
                Err(current) => last = current,
            }
        }
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RegistryStatistics {
    pub total_tasks: usize,
    pub pending_tasks: usize,
    pub in_progress_tasks: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
}
