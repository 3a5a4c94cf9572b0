use axum::{extract::State, Json};
use pssi_ai::{Persona, ProviderKind, ProviderRequest};
use pssi_host::HostStats;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::state::ApiState;

#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub status: String,
    pub optimizations: String,
    pub timestamp: String,
}

/// Ask the optimizer persona for suggestions based on local disk usage
pub async fn optimize(State(state): State<ApiState>) -> ApiResult<Json<OptimizeResponse>> {
    if !state.gateway.is_configured(ProviderKind::OpenAI) {
        tracing::warn!("System optimization rejected: OpenAI key missing");
        return Err(ApiError::internal("OpenAI API key not configured"));
    }

    let stats = HostStats::collect().await?;
    let prompt = format!(
        "Analyze this system and suggest optimizations:\nDisk Info:\n{}",
        stats.disk_report()
    );

    let request = ProviderRequest::new(ProviderKind::OpenAI, prompt)
        .with_model(Some("gpt-3.5-turbo".to_string()))
        .with_system(Persona::SystemOptimizer.instructions())
        .with_temperature(0.5);

    let response = state.gateway.call(request).await.map_err(|e| {
        tracing::error!("System optimization failed: {}", e);
        ApiError::internal(e.to_string())
    })?;

    Ok(Json(OptimizeResponse {
        status: "success".to_string(),
        optimizations: response.content,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}
