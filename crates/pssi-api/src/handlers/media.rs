use axum::{extract::State, Json};
use pssi_ai::{
    GeneratedImage, ImageOptions, Persona, ProviderKind, ProviderRequest, SpeechAudio,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::extract::{Payload, RequestSchema, Required};
use crate::state::ApiState;

const ENHANCER_MODEL: &str = "gpt-4o";
const DEFAULT_VOICE: &str = "alloy";

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub style: Option<String>,
    pub size: Option<String>,
    pub quality: Option<String>,
}

impl RequestSchema for ImageRequest {
    const REQUIRED: &'static [Required] = &[("prompt", "Prompt is required")];
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub success: bool,
    pub image: GeneratedImage,
    pub original_prompt: String,
    pub enhanced_prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct VoiceRequest {
    pub text: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_emotion")]
    pub emotion: String,
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_speed() -> f32 {
    1.0
}

fn default_emotion() -> String {
    "uplifting".to_string()
}

impl RequestSchema for VoiceRequest {
    const REQUIRED: &'static [Required] = &[("text", "Text is required")];
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceResponse {
    pub success: bool,
    pub audio: SpeechAudio,
    pub original_text: String,
    pub enhanced_text: String,
}

fn require_openai(state: &ApiState) -> ApiResult<()> {
    if state.gateway.is_configured(ProviderKind::OpenAI) {
        Ok(())
    } else {
        tracing::warn!("Media request rejected: OpenAI key missing");
        Err(ApiError::unavailable("AI provider not configured"))
    }
}

fn processing_failed(e: pssi_ai::Error) -> ApiError {
    tracing::error!("Media generation failed: {}", e);
    ApiError::internal(e.to_string())
}

/// Enhance the prompt through chat, then render it
pub async fn generate_image(
    State(state): State<ApiState>,
    Payload(payload): Payload<ImageRequest>,
) -> ApiResult<Json<ImageResponse>> {
    require_openai(&state)?;

    let defaults = ImageOptions::default();
    let options = ImageOptions {
        size: payload.size.unwrap_or(defaults.size),
        quality: payload.quality.unwrap_or(defaults.quality),
        style: payload.style.unwrap_or(defaults.style),
    };

    let enhance = ProviderRequest::new(ProviderKind::OpenAI, payload.prompt.clone())
        .with_system(Persona::ImageEnhancer.instructions())
        .with_model(Some(ENHANCER_MODEL.to_string()))
        .with_temperature(0.9)
        .with_max_tokens(200);

    let enhanced = state
        .gateway
        .call(enhance)
        .await
        .map_err(processing_failed)?
        .content;
    let enhanced_prompt = if enhanced.trim().is_empty() {
        payload.prompt.clone()
    } else {
        enhanced.trim().to_string()
    };

    let image = state
        .gateway
        .generate_image(&enhanced_prompt, &options)
        .await
        .map_err(processing_failed)?;

    Ok(Json(ImageResponse {
        success: true,
        image,
        original_prompt: payload.prompt,
        enhanced_prompt,
    }))
}

/// Speak the text with pacing and a voice chosen by emotion
pub async fn generate_voice(
    State(state): State<ApiState>,
    Payload(payload): Payload<VoiceRequest>,
) -> ApiResult<Json<VoiceResponse>> {
    require_openai(&state)?;

    let enhanced_text = shape_text(&payload.text, &payload.emotion);
    let voice = select_voice(&payload.voice, &payload.emotion);

    let audio = state
        .gateway
        .synthesize_speech(&enhanced_text, voice, payload.speed)
        .await
        .map_err(processing_failed)?;

    Ok(Json(VoiceResponse {
        success: true,
        audio,
        original_text: payload.text,
        enhanced_text,
    }))
}

/// Insert pauses so the speech engine paces the text for the emotion.
pub fn shape_text(text: &str, emotion: &str) -> String {
    match emotion {
        "uplifting" => text.replace('.', ". ").replace('!', "! "),
        "dramatic" => text.replace('.', "... "),
        "energetic" => text.replace(',', ", "),
        _ => text.to_string(),
    }
}

/// An explicit voice wins; the default voice is swapped for one matching the emotion.
pub fn select_voice<'a>(requested: &'a str, emotion: &str) -> &'a str {
    if requested != DEFAULT_VOICE {
        return requested;
    }
    match emotion {
        "uplifting" => "nova",
        "calm" => "shimmer",
        "energetic" => "echo",
        "dramatic" => "onyx",
        _ => DEFAULT_VOICE,
    }
}
