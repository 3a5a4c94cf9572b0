use axum::{extract::State, Json};
use pssi_github::{HealAction, HealReport, ScanReport};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::extract::{Payload, RequestSchema, Required};
use crate::state::ApiState;

const DEFAULT_USERNAME: &str = "pleadingSanity";

#[derive(Debug, Deserialize)]
pub struct HealRequest {
    pub action: String,
}

impl RequestSchema for HealRequest {
    const REQUIRED: &'static [Required] = &[("action", "Action is required")];
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    #[serde(default = "default_scan_action")]
    pub action: String,
    pub username: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
}

fn default_scan_action() -> String {
    "scan".to_string()
}

impl RequestSchema for ScanRequest {}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: ScanReport,
}

/// Check or fix the configured working tree
pub async fn heal(
    State(state): State<ApiState>,
    Payload(payload): Payload<HealRequest>,
) -> ApiResult<Json<HealReport>> {
    let action: HealAction = payload.action.parse()?;

    let healer = state.healer.clone();
    let report = tokio::task::spawn_blocking(move || healer.run(action))
        .await
        .map_err(|e| {
            tracing::error!("Repo heal task panicked: {}", e);
            ApiError::internal(e.to_string())
        })?;

    tracing::info!("Repo heal {:?} finished with {}", action, report.status);
    Ok(Json(report))
}

/// Scan a user's repositories or analyze one repository
pub async fn scan(
    State(state): State<ApiState>,
    Payload(payload): Payload<ScanRequest>,
) -> ApiResult<Json<Value>> {
    match payload.action.as_str() {
        "scan" => {
            let username = payload
                .username
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_USERNAME.to_string());

            let report = state.github_client.scan_user(&username).await?;
            let response = ScanResponse {
                success: true,
                report,
            };
            serde_json::to_value(response)
                .map(Json)
                .map_err(|e| ApiError::internal(e.to_string()))
        }
        "analyze" => {
            let (owner, repo) = match (payload.owner, payload.repo) {
                (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => (owner, repo),
                _ => return Err(ApiError::bad_request("Missing owner or repo parameter")),
            };

            let analysis = state.github_client.get_repository(&owner, &repo).await?;
            Ok(Json(json!({
                "success": true,
                "analysis": analysis,
            })))
        }
        _ => Err(ApiError::bad_request("Invalid action")),
    }
}
