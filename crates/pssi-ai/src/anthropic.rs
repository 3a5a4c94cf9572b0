use crate::{
    provider::{decode, upstream_error, ChatProvider, ProviderKind, ProviderRequest, ProviderResponse, Usage},
    Error, Result,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl AnthropicClient {
    pub fn new(client: Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            api_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn call_api(&self, body: &MessagesRequest<'_>) -> Result<MessagesResponse> {
        let response = self
            .client
            .post(format!("{}/v1/messages", self.api_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error(ProviderKind::Anthropic, response, "Anthropic request failed").await);
        }

        let text = response.text().await?;
        decode(ProviderKind::Anthropic, &text)
    }
}

#[async_trait]
impl ChatProvider for AnthropicClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let model = request.model();
        tracing::info!("Calling Anthropic with model {}", model);

        let body = MessagesRequest {
            model,
            system: request.system.as_deref(),
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens(),
            temperature: request.temperature(),
        };

        let result = self.call_api(&body).await?;

        let content = result
            .content
            .first()
            .ok_or_else(|| Error::ParseError("Anthropic response contained no content".to_string()))?
            .text
            .clone()
            .unwrap_or_default();

        let usage = result.usage.map(|u| Usage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.input_tokens + u.output_tokens,
        });

        Ok(ProviderResponse::completed(
            ProviderKind::Anthropic,
            result.model.unwrap_or_else(|| model.to_string()),
            content,
            usage,
        ))
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<MessagesUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_messages_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "ak-test")
            .match_header("anthropic-version", "2023-06-01")
            .match_body(Matcher::PartialJson(json!({
                "model": "claude-3-5-sonnet-20241022",
                "system": "you are terse",
                "messages": [{"role": "user", "content": "hi"}],
                "max_tokens": 1000
            })))
            .with_status(200)
            .with_body(
                r#"{"model":"claude-3-5-sonnet-20241022","content":[{"type":"text","text":"Hello"}],
                    "usage":{"input_tokens":10,"output_tokens":4}}"#,
            )
            .create_async()
            .await;

        let client = AnthropicClient::new(Client::new(), "ak-test".to_string()).with_base_url(server.url());
        let request = ProviderRequest::new(ProviderKind::Anthropic, "hi").with_system("you are terse");
        let response = client.complete(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "Hello");
        let usage = response.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 10);
        assert_eq!(usage.completion_tokens, 4);
        assert_eq!(usage.total_tokens, 14);
    }

    #[test]
    fn test_system_is_omitted_when_absent() {
        let body = MessagesRequest {
            model: "claude-3-5-sonnet-20241022",
            system: None,
            messages: vec![Message {
                role: "user",
                content: "hi",
            }],
            max_tokens: 1000,
            temperature: 0.7,
        };
        let value = serde_json::to_value(&body).unwrap();

        assert!(value.get("system").is_none());
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn test_missing_usage_and_model_fall_back() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(r#"{"content":[{"type":"text","text":"ok"}]}"#)
            .create_async()
            .await;

        let client = AnthropicClient::new(Client::new(), "ak-test".to_string()).with_base_url(server.url());
        let request = ProviderRequest::new(ProviderKind::Anthropic, "hi");
        let response = client.complete(&request).await.unwrap();

        assert_eq!(response.content, "ok");
        assert!(response.usage.is_none());
        assert_eq!(response.model, "claude-3-5-sonnet-20241022");
    }

    #[tokio::test]
    async fn test_empty_content_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(r#"{"model":"claude-3-5-sonnet-20241022","content":[]}"#)
            .create_async()
            .await;

        let client = AnthropicClient::new(Client::new(), "ak-test".to_string()).with_base_url(server.url());
        let request = ProviderRequest::new(ProviderKind::Anthropic, "hi");
        let err = client.complete(&request).await.unwrap_err();

        assert!(matches!(err, Error::ParseError(_)));
    }

    #[tokio::test]
    async fn test_error_falls_back_to_default_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(401)
            .with_body("{}")
            .create_async()
            .await;

        let client = AnthropicClient::new(Client::new(), "bad".to_string()).with_base_url(server.url());
        let request = ProviderRequest::new(ProviderKind::Anthropic, "hi");
        let err = client.complete(&request).await.unwrap_err();

        assert_eq!(err.to_string(), "Anthropic request failed");
        assert_eq!(err.upstream_status(), Some(401));
    }
}
