use crate::{
    provider::{decode, upstream_error, ChatProvider, ProviderKind, ProviderRequest, ProviderResponse, Usage},
    Error, Result,
};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

const IMAGE_MODEL: &str = "dall-e-3";
const SPEECH_MODEL: &str = "tts-1-hd";

pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
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

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        Ok(response)
    }

    /// DALL-E 3 image for `prompt`; the prompt is sent as given.
    pub async fn generate_image(&self, prompt: &str, options: &ImageOptions) -> Result<GeneratedImage> {
        tracing::info!("Generating image ({}, {}, {})", options.size, options.quality, options.style);

        let response = self
            .post(
                "/v1/images/generations",
                json!({
                    "model": IMAGE_MODEL,
                    "prompt": prompt,
                    "n": 1,
                    "size": options.size,
                    "quality": options.quality,
                    "style": options.style,
                }),
            )
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error(ProviderKind::OpenAI, response, "Image generation failed").await);
        }

        let body = response.text().await?;
        let result: ImageGenerationResponse = decode(ProviderKind::OpenAI, &body)?;
        let image = result
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Error::ParseError("Image response contained no data".to_string()))?;

        Ok(GeneratedImage {
            url: image.url,
            revised_prompt: image.revised_prompt,
        })
    }

    /// Text-to-speech, returned as base64 encoded MP3.
    pub async fn synthesize_speech(&self, text: &str, voice: &str, speed: f32) -> Result<SpeechAudio> {
        tracing::info!("Synthesizing speech with voice {}", voice);

        let response = self
            .post(
                "/v1/audio/speech",
                json!({
                    "model": SPEECH_MODEL,
                    "input": text,
                    "voice": voice,
                    "speed": speed,
                }),
            )
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error(ProviderKind::OpenAI, response, "Voice generation failed").await);
        }

        let audio = response.bytes().await?;

        Ok(SpeechAudio {
            base64: base64::engine::general_purpose::STANDARD.encode(&audio),
            mime_type: "audio/mpeg".to_string(),
            voice: voice.to_string(),
            speed,
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAIClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let model = request.model();
        tracing::info!("Calling OpenAI with model {}", model);

        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(Message {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(Message {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        let response = self
            .post(
                "/v1/chat/completions",
                json!({
                    "model": model,
                    "messages": messages,
                    "temperature": request.temperature(),
                    "max_tokens": request.max_tokens(),
                }),
            )
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error(ProviderKind::OpenAI, response, "OpenAI request failed").await);
        }

        let body = response.text().await?;
        let result: ChatCompletionResponse = decode(ProviderKind::OpenAI, &body)?;

        let choice = result
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::ParseError("OpenAI response contained no choices".to_string()))?;
        let content = choice.message.content.unwrap_or_default();

        let usage = result.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse::completed(
            ProviderKind::OpenAI,
            result.model.unwrap_or_else(|| model.to_string()),
            content,
            usage,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageOptions {
    pub size: String,
    pub quality: String,
    pub style: String,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            size: "1024x1024".to_string(),
            quality: "hd".to_string(),
            style: "vivid".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechAudio {
    pub base64: String,
    pub mime_type: String,
    pub voice: String,
    pub speed: f32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: String,
    revised_prompt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> OpenAIClient {
        OpenAIClient::new(Client::new(), "sk-test".to_string()).with_base_url(server.url())
    }

    #[tokio::test]
    async fn test_chat_completion_maps_content_and_usage() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o",
                "max_tokens": 1000,
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .with_status(200)
            .with_body(
                r#"{"model":"gpt-4o-2024-08-06","choices":[{"message":{"role":"assistant","content":"Hi there"}}],
                    "usage":{"prompt_tokens":5,"completion_tokens":2,"total_tokens":7}}"#,
            )
            .create_async()
            .await;

        let request = ProviderRequest::new(ProviderKind::OpenAI, "hello").with_system("be brief");
        let response = client_for(&server).complete(&request).await.unwrap();

        mock.assert_async().await;
        assert!(response.success);
        assert_eq!(response.content, "Hi there");
        assert_eq!(response.model, "gpt-4o-2024-08-06");
        assert_eq!(response.usage.unwrap().total_tokens, 7);
    }

    #[tokio::test]
    async fn test_upstream_error_message_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"Rate limit reached"}}"#)
            .create_async()
            .await;

        let request = ProviderRequest::new(ProviderKind::OpenAI, "hello");
        let err = client_for(&server).complete(&request).await.unwrap_err();

        assert_eq!(err.to_string(), "Rate limit reached");
        assert_eq!(err.upstream_status(), Some(429));
    }

    #[tokio::test]
    async fn test_unparseable_error_uses_default_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let request = ProviderRequest::new(ProviderKind::OpenAI, "hello");
        let err = client_for(&server).complete(&request).await.unwrap_err();

        assert_eq!(err.to_string(), "OpenAI request failed");
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let request = ProviderRequest::new(ProviderKind::OpenAI, "hello");
        let err = client_for(&server).complete(&request).await.unwrap_err();

        assert!(matches!(err, Error::ParseError(_)));
    }

    #[tokio::test]
    async fn test_empty_choices_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"model":"gpt-4o","choices":[]}"#)
            .create_async()
            .await;

        let request = ProviderRequest::new(ProviderKind::OpenAI, "hello");
        let err = client_for(&server).complete(&request).await.unwrap_err();

        assert!(matches!(err, Error::ParseError(_)));
        assert_eq!(err.upstream_status(), None);
    }

    #[tokio::test]
    async fn test_generate_image() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/images/generations")
            .match_body(Matcher::PartialJson(json!({
                "model": "dall-e-3",
                "n": 1,
                "size": "1024x1024",
                "quality": "hd",
                "style": "vivid"
            })))
            .with_status(200)
            .with_body(r#"{"data":[{"url":"https://img.example/1.png","revised_prompt":"a bright sunrise"}]}"#)
            .create_async()
            .await;

        let image = client_for(&server)
            .generate_image("sunrise", &ImageOptions::default())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(image.url, "https://img.example/1.png");
        assert_eq!(image.revised_prompt.as_deref(), Some("a bright sunrise"));
    }

    #[tokio::test]
    async fn test_synthesize_speech_encodes_audio() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/audio/speech")
            .match_body(Matcher::PartialJson(json!({"model": "tts-1-hd", "voice": "nova"})))
            .with_status(200)
            .with_header("content-type", "audio/mpeg")
            .with_body(vec![1u8, 2, 3])
            .create_async()
            .await;

        let audio = client_for(&server)
            .synthesize_speech("Hello.", "nova", 1.0)
            .await
            .unwrap();

        assert_eq!(audio.base64, "AQID");
        assert_eq!(audio.mime_type, "audio/mpeg");
        assert_eq!(audio.voice, "nova");
    }

    #[tokio::test]
    async fn test_speech_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/audio/speech")
            .with_status(500)
            .create_async()
            .await;

        let err = client_for(&server)
            .synthesize_speech("Hello.", "nova", 1.0)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Voice generation failed");
    }
}
