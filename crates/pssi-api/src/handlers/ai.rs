use axum::{extract::State, Json};
use futures_util::future::join_all;
use pssi_ai::{Persona, ProviderKind, ProviderRequest, ProviderResponse, Usage};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::extract::{Payload, RequestSchema, Required};
use crate::state::ApiState;

const DEFAULT_COUNCIL_PROBLEM: &str = "How to optimize system performance?";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub provider: Option<String>,
    pub prompt: String,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl RequestSchema for ChatRequest {
    const REQUIRED: &'static [Required] = &[("prompt", "Prompt is required")];
}

#[derive(Debug, Deserialize)]
pub struct TestRequest {
    pub prompt: String,
    pub model: Option<String>,
}

impl RequestSchema for TestRequest {
    const REQUIRED: &'static [Required] = &[("prompt", "Prompt is required")];
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouncilRequest {
    pub problem: Option<String>,
    #[serde(alias = "councilMembers")]
    pub members: Option<Vec<String>>,
}

impl RequestSchema for CouncilRequest {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResponse {
    pub success: bool,
    pub model: String,
    pub prompt: String,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouncilResponse {
    pub success: bool,
    pub problem: String,
    pub members: Vec<ProviderResponse>,
    pub council_size: usize,
    pub responded: usize,
    pub deliberation_time: String,
}

/// `auto` or no selector picks the first configured provider.
fn resolve_provider(state: &ApiState, requested: Option<&str>) -> ApiResult<ProviderKind> {
    match requested.map(str::trim) {
        None | Some("") | Some("auto") => Ok(state.gateway.select(None)),
        Some(name) => name
            .parse::<ProviderKind>()
            .map(|kind| state.gateway.select(Some(kind)))
            .map_err(|_| ApiError::bad_request("Invalid provider")),
    }
}

/// 503 body for a provider without a credential, listing the usable ones.
fn provider_unavailable(state: &ApiState, kind: ProviderKind) -> ApiError {
    let available: Vec<&str> = state
        .gateway
        .available_providers()
        .iter()
        .map(|p| p.id())
        .collect();

    tracing::warn!("Rejected request for unconfigured provider {}", kind);

    ApiError::unavailable(pssi_ai::Error::NotConfigured(kind).to_string())
        .with("success", json!(false))
        .with("availableProviders", json!(available))
}

/// Send a chat message to a provider
pub async fn chat(
    State(state): State<ApiState>,
    Payload(payload): Payload<ChatRequest>,
) -> ApiResult<Json<ProviderResponse>> {
    let provider = resolve_provider(&state, payload.provider.as_deref())?;

    if !state.gateway.is_configured(provider) {
        return Err(provider_unavailable(&state, provider));
    }

    let mut request = ProviderRequest::new(provider, payload.prompt).with_model(payload.model);
    if let Some(temperature) = payload.temperature {
        request = request.with_temperature(temperature);
    }
    if let Some(max_tokens) = payload.max_tokens {
        request = request.with_max_tokens(max_tokens);
    }

    let response = state.gateway.call(request).await?;
    Ok(Json(response))
}

/// Smoke test a prompt against the default provider
pub async fn test_prompt(
    State(state): State<ApiState>,
    Payload(payload): Payload<TestRequest>,
) -> ApiResult<Json<TestResponse>> {
    let provider = state.gateway.select(None);
    if !state.gateway.is_configured(provider) {
        return Err(provider_unavailable(&state, provider));
    }

    let request = ProviderRequest::new(provider, payload.prompt.clone()).with_model(payload.model);
    let response = state.gateway.call(request).await?;

    Ok(Json(TestResponse {
        success: true,
        model: response.model,
        prompt: payload.prompt,
        response: response.content,
        usage: response.usage,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

/// Ask every requested provider the same question concurrently.
/// Individual failures are reported per member.
pub async fn council(
    State(state): State<ApiState>,
    Payload(payload): Payload<CouncilRequest>,
) -> Json<CouncilResponse> {
    let problem = payload
        .problem
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_COUNCIL_PROBLEM.to_string());

    let mut members: Vec<ProviderKind> = Vec::new();
    match payload.members {
        Some(names) => {
            for name in names {
                match name.parse::<ProviderKind>() {
                    Ok(kind) if !members.contains(&kind) => members.push(kind),
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Skipping council member: {}", e),
                }
            }
        }
        None => members.extend(ProviderKind::ALL),
    }

    tracing::info!("Council deliberating on: {} ({} members)", problem, members.len());

    let calls = members.iter().map(|&kind| {
        let gateway = state.gateway.clone();
        let problem = problem.clone();
        async move {
            if !gateway.is_configured(kind) {
                return ProviderResponse::failed(
                    kind,
                    kind.default_model(),
                    pssi_ai::Error::NotConfigured(kind).to_string(),
                );
            }

            let request = ProviderRequest::new(kind, problem)
                .with_system(Persona::CouncilMember.instructions());
            match gateway.call(request).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!("Council member {} failed: {}", kind, e);
                    ProviderResponse::failed(kind, kind.default_model(), e.to_string())
                }
            }
        }
    });

    let responses = join_all(calls).await;
    let responded = responses.iter().filter(|r| r.success).count();

    Json(CouncilResponse {
        success: true,
        problem,
        council_size: responses.len(),
        responded,
        members: responses,
        deliberation_time: chrono::Utc::now().to_rfc3339(),
    })
}

/// Report which providers have credentials
pub async fn ai_health(State(state): State<ApiState>) -> Json<Value> {
    let available = state.gateway.available_providers();
    let mut providers = serde_json::Map::new();
    for kind in ProviderKind::ALL {
        providers.insert(kind.id().to_string(), json!(available.contains(&kind)));
    }

    let status = if available.is_empty() {
        "no providers configured"
    } else {
        "healthy"
    };

    Json(json!({
        "status": status,
        "providers": providers,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// List configured providers
pub async fn list_providers(State(state): State<ApiState>) -> Json<Value> {
    let providers: Vec<Value> = state
        .gateway
        .available_providers()
        .into_iter()
        .map(|kind| json!({ "id": kind.id(), "name": kind.display_name() }))
        .collect();

    Json(json!({
        "total": providers.len(),
        "providers": providers,
    }))
}
