use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::extract::{Payload, RequestSchema, Required};
use crate::state::ApiState;

/// Build hook URLs per hosting platform.
#[derive(Debug, Clone, Default)]
pub struct DeployHooks {
    pub netlify: Option<String>,
    pub vercel: Option<String>,
}

impl DeployHooks {
    /// `Ok(None)` for a known platform without a hook; `Err` for an unknown one.
    pub fn url(&self, platform: &str) -> Result<Option<&str>, ApiError> {
        let hook = match platform {
            "netlify" => &self.netlify,
            "vercel" => &self.vercel,
            other => return Err(ApiError::not_found(format!("Unknown platform: {}", other))),
        };
        Ok(hook.as_deref().filter(|url| !url.trim().is_empty()))
    }
}

#[derive(Debug, Deserialize)]
pub struct HookRequest {
    pub event: String,
    #[serde(default)]
    pub payload: Option<Value>,
}

impl RequestSchema for HookRequest {
    const REQUIRED: &'static [Required] = &[("event", "Event type is required")];
}

#[derive(Debug, Serialize)]
pub struct HookResponse {
    pub status: String,
    pub event: String,
    pub processed: bool,
    pub timestamp: String,
    pub message: String,
}

/// Record an incoming deploy event
pub async fn hook(Payload(payload): Payload<HookRequest>) -> Json<HookResponse> {
    tracing::info!(
        "Deploy hook received: {} (payload: {})",
        payload.event,
        payload.payload.as_ref().map(|v| v.to_string()).unwrap_or_default()
    );

    Json(HookResponse {
        status: "success".to_string(),
        message: format!("Deploy hook '{}' processed successfully", payload.event),
        event: payload.event,
        processed: true,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Fire the platform's build hook
pub async fn trigger(
    State(state): State<ApiState>,
    Path(platform): Path<String>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Some(url) = state.deploy_hooks.url(&platform)? else {
        tracing::warn!("No build hook configured for {}", platform);
        return Err(
            ApiError::bad_request(format!("No build hook configured for {}", platform))
                .with("status", json!("dry-run"))
                .with("platform", json!(platform)),
        );
    };

    let response = state
        .http
        .post(url)
        .json(&json!({}))
        .send()
        .await
        .map_err(|e| {
            tracing::error!("Build hook for {} failed: {}", platform, e);
            ApiError::internal(e.to_string())
        })?;

    if !response.status().is_success() {
        let status = response.status();
        tracing::error!("Build hook for {} returned {}", platform, status);
        return Err(ApiError::internal(format!(
            "Build hook returned {}",
            status
        )));
    }

    tracing::info!("Triggered {} deploy", platform);

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "accepted",
            "platform": platform,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    ))
}
