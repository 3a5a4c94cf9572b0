use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
    Gemini,
}

impl ProviderKind {
    /// Every provider, in auto-selection order.
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::OpenAI,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OpenAI GPT-4o",
            ProviderKind::Anthropic => "Anthropic Claude 3.5",
            ProviderKind::Gemini => "Google Gemini 2.0",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "gpt-4o",
            ProviderKind::Anthropic => "claude-3-5-sonnet-20241022",
            ProviderKind::Gemini => "gemini-2.0-flash-exp",
        }
    }

    /// Credential variables, build-time-exposed name first.
    pub fn env_vars(&self) -> [&'static str; 2] {
        match self {
            ProviderKind::OpenAI => ["VITE_OPENAI_API_KEY", "OPENAI_API_KEY"],
            ProviderKind::Anthropic => ["VITE_ANTHROPIC_API_KEY", "ANTHROPIC_API_KEY"],
            ProviderKind::Gemini => ["VITE_GEMINI_API_KEY", "GEMINI_API_KEY"],
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "gpt-4o" | "gpt-4" => Ok(ProviderKind::OpenAI),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// A single completion request, independent of the provider's wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub provider: ProviderKind,
    pub prompt: String,
    pub system: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ProviderRequest {
    pub fn new(provider: ProviderKind, prompt: impl Into<String>) -> Self {
        Self {
            provider,
            prompt: prompt.into(),
            system: None,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Uniform shape every provider answer is normalized into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResponse {
    pub success: bool,
    pub provider: ProviderKind,
    pub model: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderResponse {
    pub fn completed(
        provider: ProviderKind,
        model: impl Into<String>,
        content: impl Into<String>,
        usage: Option<Usage>,
    ) -> Self {
        Self {
            success: true,
            provider,
            model: model.into(),
            content: content.into(),
            usage,
            error: None,
        }
    }

    pub fn failed(provider: ProviderKind, model: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            provider,
            model: model.into(),
            content: String::new(),
            usage: None,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider this client talks to
    fn kind(&self) -> ProviderKind;

    /// Issue exactly one completion call
    async fn complete(&self, request: &ProviderRequest) -> crate::Result<ProviderResponse>;
}

/// Turn a non-2xx answer into a provider error, preferring the upstream
/// `error.message` over the generic fallback.
pub(crate) async fn upstream_error(
    provider: ProviderKind,
    response: reqwest::Response,
    fallback: &str,
) -> crate::Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| fallback.to_string());

    tracing::warn!("{} returned HTTP {}: {}", provider, status, message);

    crate::Error::Provider {
        provider,
        status,
        message,
    }
}

/// Decode a success body, reporting malformed payloads as parse errors.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    provider: ProviderKind,
    body: &str,
) -> crate::Result<T> {
    serde_json::from_str(body).map_err(|e| {
        crate::Error::ParseError(format!("Unexpected {} response: {}", provider, e))
    })
}
