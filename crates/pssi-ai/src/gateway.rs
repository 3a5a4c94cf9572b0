use crate::{
    anthropic::{self, AnthropicClient},
    credentials::Credentials,
    gemini::{self, GeminiClient},
    openai::{self, GeneratedImage, ImageOptions, OpenAIClient, SpeechAudio},
    provider::{ChatProvider, ProviderKind, ProviderRequest, ProviderResponse},
    Error, Result,
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Single entry point for every outbound AI call.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Providers with a credential, in auto-selection order
    fn available_providers(&self) -> Vec<ProviderKind>;

    fn is_configured(&self, kind: ProviderKind) -> bool {
        self.available_providers().contains(&kind)
    }

    /// Resolve a requested provider; `None` means auto.
    fn select(&self, requested: Option<ProviderKind>) -> ProviderKind {
        requested.unwrap_or_else(|| {
            self.available_providers()
                .first()
                .copied()
                .unwrap_or(ProviderKind::OpenAI)
        })
    }

    /// Issue exactly one completion call
    async fn call(&self, request: ProviderRequest) -> Result<ProviderResponse>;

    async fn generate_image(&self, prompt: &str, options: &ImageOptions) -> Result<GeneratedImage>;

    async fn synthesize_speech(&self, text: &str, voice: &str, speed: f32) -> Result<SpeechAudio>;
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub timeout: Duration,
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub gemini_base_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            openai_base_url: openai::DEFAULT_BASE_URL.to_string(),
            anthropic_base_url: anthropic::DEFAULT_BASE_URL.to_string(),
            gemini_base_url: gemini::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Gateway backed by the real provider HTTP APIs.
pub struct ProviderGateway {
    credentials: Credentials,
    config: GatewayConfig,
    client: Client,
}

impl ProviderGateway {
    pub fn new(credentials: Credentials, config: GatewayConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            credentials,
            config,
            client,
        })
    }

    fn key(&self, kind: ProviderKind) -> Result<String> {
        self.credentials
            .get(kind)
            .map(str::to_string)
            .ok_or(Error::NotConfigured(kind))
    }

    fn provider(&self, kind: ProviderKind) -> Result<Box<dyn ChatProvider>> {
        let key = self.key(kind)?;
        let client = self.client.clone();

        let provider: Box<dyn ChatProvider> = match kind {
            ProviderKind::OpenAI => {
                Box::new(OpenAIClient::new(client, key).with_base_url(&self.config.openai_base_url))
            }
            ProviderKind::Anthropic => Box::new(
                AnthropicClient::new(client, key).with_base_url(&self.config.anthropic_base_url),
            ),
            ProviderKind::Gemini => {
                Box::new(GeminiClient::new(client, key).with_base_url(&self.config.gemini_base_url))
            }
        };
        Ok(provider)
    }

    fn openai(&self) -> Result<OpenAIClient> {
        let key = self.key(ProviderKind::OpenAI)?;
        Ok(OpenAIClient::new(self.client.clone(), key).with_base_url(&self.config.openai_base_url))
    }
}

#[async_trait]
impl Gateway for ProviderGateway {
    fn available_providers(&self) -> Vec<ProviderKind> {
        self.credentials.configured()
    }

    async fn call(&self, request: ProviderRequest) -> Result<ProviderResponse> {
        if request.prompt.trim().is_empty() {
            return Err(Error::Validation("Prompt is required".to_string()));
        }

        let provider = self.provider(request.provider)?;
        provider.complete(&request).await
    }

    async fn generate_image(&self, prompt: &str, options: &ImageOptions) -> Result<GeneratedImage> {
        if prompt.trim().is_empty() {
            return Err(Error::Validation("Prompt is required".to_string()));
        }
        self.openai()?.generate_image(prompt, options).await
    }

    async fn synthesize_speech(&self, text: &str, voice: &str, speed: f32) -> Result<SpeechAudio> {
        if text.trim().is_empty() {
            return Err(Error::Validation("Text is required".to_string()));
        }
        self.openai()?.synthesize_speech(text, voice, speed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway_for(credentials: Credentials, server: &mockito::ServerGuard) -> ProviderGateway {
        let config = GatewayConfig {
            timeout: Duration::from_secs(5),
            openai_base_url: server.url(),
            anthropic_base_url: server.url(),
            gemini_base_url: server.url(),
        };
        ProviderGateway::new(credentials, config).unwrap()
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let gateway = gateway_for(Credentials::new(), &server);
        let err = gateway
            .call(ProviderRequest::new(ProviderKind::Anthropic, "hi"))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, Error::NotConfigured(ProviderKind::Anthropic)));
        assert_eq!(
            err.to_string(),
            "anthropic is not configured. Please add API key."
        );
    }

    #[tokio::test]
    async fn test_empty_prompt_is_rejected_before_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let gateway = gateway_for(
            Credentials::new().with_key(ProviderKind::OpenAI, "sk"),
            &server,
        );
        let err = gateway
            .call(ProviderRequest::new(ProviderKind::OpenAI, ""))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_call_routes_to_selected_provider() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(r#"{"content":[{"type":"text","text":"from claude"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let gateway = gateway_for(
            Credentials::new().with_key(ProviderKind::Anthropic, "ak"),
            &server,
        );
        let response = gateway
            .call(ProviderRequest::new(ProviderKind::Anthropic, "hi"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.provider, ProviderKind::Anthropic);
        assert_eq!(response.content, "from claude");
    }

    #[test]
    fn test_auto_selection_order() {
        let none = ProviderGateway::new(Credentials::new(), GatewayConfig::default()).unwrap();
        assert_eq!(none.select(None), ProviderKind::OpenAI);

        let gemini_only = ProviderGateway::new(
            Credentials::new().with_key(ProviderKind::Gemini, "g"),
            GatewayConfig::default(),
        )
        .unwrap();
        assert_eq!(gemini_only.select(None), ProviderKind::Gemini);
        assert_eq!(
            gemini_only.select(Some(ProviderKind::Anthropic)),
            ProviderKind::Anthropic
        );

        let both = ProviderGateway::new(
            Credentials::new()
                .with_key(ProviderKind::Gemini, "g")
                .with_key(ProviderKind::Anthropic, "a"),
            GatewayConfig::default(),
        )
        .unwrap();
        assert_eq!(both.select(None), ProviderKind::Anthropic);
        assert!(!both.is_configured(ProviderKind::OpenAI));
    }
}
