use crate::{
    provider::{decode, upstream_error, ChatProvider, ProviderKind, ProviderRequest, ProviderResponse, Usage},
    Error, Result,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(client: Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Gemini takes no separate system message, so it is folded into the prompt.
fn prompt_text(request: &ProviderRequest) -> String {
    match &request.system {
        Some(system) => format!("{}\n\nUser: {}", system, request.prompt),
        None => request.prompt.clone(),
    }
}

#[async_trait]
impl ChatProvider for GeminiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let model = request.model();
        tracing::info!("Calling Gemini with model {}", model);

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, model
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "contents": [{
                    "parts": [{ "text": prompt_text(request) }]
                }],
                "generationConfig": {
                    "temperature": request.temperature(),
                    "maxOutputTokens": request.max_tokens(),
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error(ProviderKind::Gemini, response, "Gemini request failed").await);
        }

        let body = response.text().await?;
        let result: GenerateContentResponse = decode(ProviderKind::Gemini, &body)?;

        let part = result
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .ok_or_else(|| Error::ParseError("Gemini response contained no candidates".to_string()))?;
        let content = part.text.unwrap_or_default();

        let usage = result.usage_metadata.unwrap_or_default();

        Ok(ProviderResponse::completed(
            ProviderKind::Gemini,
            model,
            content,
            Some(Usage {
                prompt_tokens: usage.prompt_token_count,
                completion_tokens: usage.candidates_token_count,
                total_tokens: usage.total_token_count,
            }),
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}
