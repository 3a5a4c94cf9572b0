use crate::{
    gateway::Gateway,
    persona::Persona,
    provider::{ProviderKind, ProviderRequest},
};
use async_trait::async_trait;
use pssi_core::{TaskAnalysis, TaskAnalyzer};
use std::sync::Arc;

const ANALYSIS_MODEL: &str = "gpt-3.5-turbo";
const ANALYSIS_TEMPERATURE: f32 = 0.3;

/// Asks OpenAI, in the task-automation persona, how a task could be automated.
pub struct TaskAdvisor {
    gateway: Arc<dyn Gateway>,
}

impl TaskAdvisor {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    pub fn request_for(description: &str) -> ProviderRequest {
        ProviderRequest::new(
            ProviderKind::OpenAI,
            format!("Analyze this task for automation: {}", description),
        )
        .with_system(Persona::TaskAutomation.instructions())
        .with_model(Some(ANALYSIS_MODEL.to_string()))
        .with_temperature(ANALYSIS_TEMPERATURE)
    }
}

#[async_trait]
impl TaskAnalyzer for TaskAdvisor {
    async fn analyze(&self, description: &str) -> pssi_core::Result<TaskAnalysis> {
        let response = self
            .gateway
            .call(Self::request_for(description))
            .await
            .map_err(|e| pssi_core::Error::AnalysisFailed(e.to_string()))?;

        Ok(TaskAnalysis::from_response(&response.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Credentials, GatewayConfig, ProviderGateway};
    use mockito::Matcher;
    use serde_json::json;
    use std::time::Duration;

    fn advisor_for(server: &mockito::ServerGuard, credentials: Credentials) -> TaskAdvisor {
        let config = GatewayConfig {
            timeout: Duration::from_secs(5),
            openai_base_url: server.url(),
            ..GatewayConfig::default()
        };
        TaskAdvisor::new(Arc::new(ProviderGateway::new(credentials, config).unwrap()))
    }

    #[test]
    fn test_request_shape() {
        let request = TaskAdvisor::request_for("clean downloads");
        assert_eq!(request.model(), "gpt-3.5-turbo");
        assert_eq!(request.temperature(), 0.3);
        assert_eq!(request.prompt, "Analyze this task for automation: clean downloads");
        assert_eq!(request.provider, ProviderKind::OpenAI);
    }

    #[tokio::test]
    async fn test_analyze_parses_json_answer() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::PartialJson(json!({"model": "gpt-3.5-turbo"})))
            .with_status(200)
            .with_body(
                json!({
                    "choices": [{"message": {"content":
                        "{\"analysis\":\"remove temp files\",\"steps\":[\"rm /tmp/*.log\"],\"safe\":true,\"requires_confirmation\":false}"
                    }}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let advisor = advisor_for(&server, Credentials::new().with_key(ProviderKind::OpenAI, "sk"));
        let analysis = advisor.analyze("clean temp").await.unwrap();

        assert_eq!(analysis.analysis, "remove temp files");
        assert!(analysis.allows_auto_complete());
    }

    #[tokio::test]
    async fn test_analyze_keeps_prose_answer() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"Just delete them manually."}}]}"#)
            .create_async()
            .await;

        let advisor = advisor_for(&server, Credentials::new().with_key(ProviderKind::OpenAI, "sk"));
        let analysis = advisor.analyze("clean temp").await.unwrap();

        assert_eq!(analysis.analysis, "Just delete them manually.");
        assert!(!analysis.safe);
        assert!(analysis.requires_confirmation);
    }

    #[tokio::test]
    async fn test_provider_failure_becomes_analysis_failure() {
        let server = mockito::Server::new_async().await;
        let advisor = advisor_for(&server, Credentials::new());

        let err = advisor.analyze("clean temp").await.unwrap_err();
        assert!(matches!(err, pssi_core::Error::AnalysisFailed(_)));
    }
}
