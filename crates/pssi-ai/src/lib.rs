pub mod analyzer;
pub mod anthropic;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod gemini;
pub mod openai;
pub mod persona;
pub mod provider;

// Re-exports
pub use analyzer::TaskAdvisor;
pub use anthropic::AnthropicClient;
pub use credentials::Credentials;
pub use error::{Error, Result};
pub use gateway::{Gateway, GatewayConfig, ProviderGateway};
pub use gemini::GeminiClient;
pub use openai::{GeneratedImage, ImageOptions, OpenAIClient, SpeechAudio};
pub use persona::{compose, Persona};
pub use provider::{ChatProvider, ProviderKind, ProviderRequest, ProviderResponse, Usage};
