use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use pssi_ai::{compose, ProviderRequest};
use serde_json::{json, Map, Value};

use crate::capabilities::{self, CAPABILITIES};
use crate::error::{ApiError, ApiResult};
use crate::extract::{check_required, parse_object};
use crate::state::ApiState;

/// List capability names
pub async fn list_capabilities() -> Json<Value> {
    let names: Vec<&str> = CAPABILITIES.iter().map(|c| c.name).collect();
    Json(json!({
        "total": names.len(),
        "capabilities": names,
    }))
}

/// Run a capability: validate, compose, call, map.
pub async fn run_capability(
    Path(name): Path<String>,
    State(state): State<ApiState>,
    body: Bytes,
) -> ApiResult<Json<Map<String, Value>>> {
    let spec = capabilities::find(&name)
        .ok_or_else(|| ApiError::not_found(format!("Unknown capability: {}", name)))?;

    let input = parse_object(&body)?;
    check_required(&input, &spec.required())?;

    let provider = spec
        .providers
        .iter()
        .copied()
        .find(|&kind| state.gateway.is_configured(kind))
        .ok_or_else(|| {
            tracing::warn!("No provider configured for capability {}", spec.name);
            ApiError::unavailable("AI provider not configured")
        })?;

    let prompt = compose(spec.persona, &spec.render(&input))?;
    let request = ProviderRequest::new(provider, prompt)
        .with_temperature(spec.temperature)
        .with_max_tokens(spec.max_tokens);

    tracing::info!("Running capability {} via {}", spec.name, provider);

    let response = state.gateway.call(request).await.map_err(|e| {
        tracing::error!("Capability {} failed: {}", spec.name, e);
        ApiError::internal(e.to_string())
    })?;

    Ok(Json(spec.map_response(
        response.provider,
        &response.model,
        &response.content,
    )))
}
