use axum::{
    extract::{Path, State},
    Json,
};
use pssi_ai::{ProviderKind, TaskAdvisor};
use pssi_core::{RegistryStatistics, Task, TaskAnalysis};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::extract::{Payload, RequestSchema, Required};
use crate::state::ApiState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomateRequest {
    pub task: String,
    #[serde(default)]
    pub auto_execute: bool,
}

impl RequestSchema for AutomateRequest {
    const REQUIRED: &'static [Required] = &[("task", "Task description is required")];
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomateResponse {
    pub task_id: String,
    pub analysis: TaskAnalysis,
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub total: usize,
    pub statistics: RegistryStatistics,
}

/// Submit a task for AI analysis
pub async fn automate_task(
    State(state): State<ApiState>,
    Payload(payload): Payload<AutomateRequest>,
) -> ApiResult<Json<AutomateResponse>> {
    if !state.gateway.is_configured(ProviderKind::OpenAI) {
        tracing::warn!("Task automation rejected: OpenAI key missing");
        return Err(ApiError::internal("OpenAI API key not configured"));
    }

    let advisor = TaskAdvisor::new(state.gateway.clone());
    let (task, analysis) = state
        .registry
        .submit(payload.task, payload.auto_execute, &advisor)
        .await?;

    Ok(Json(AutomateResponse {
        task_id: task.id.clone(),
        analysis,
        task,
    }))
}

/// List all tasks
pub async fn list_tasks(State(state): State<ApiState>) -> Json<TaskListResponse> {
    let tasks = state.registry.list().await;
    let statistics = state.registry.get_statistics().await;

    Json(TaskListResponse {
        total: tasks.len(),
        tasks,
        statistics,
    })
}

/// Get task status
pub async fn get_task(
    State(state): State<ApiState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Task>> {
    let task = state.registry.get(&task_id).await?;
    Ok(Json(task))
}
