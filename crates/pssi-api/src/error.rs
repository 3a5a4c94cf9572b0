use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

/// JSON error response: a status code and an object body.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: Map<String, Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        let mut body = Map::new();
        body.insert("error".to_string(), Value::String(error.into()));
        Self { status, body }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    pub fn unavailable(error: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, error)
    }

    /// Processing failure: `{success: false, error}` with 500.
    pub fn internal(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error).with("success", json!(false))
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.body.insert(key.to_string(), value);
        self
    }

    pub fn message(&self) -> &str {
        self.body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(Value::Object(self.body))).into_response()
    }
}

impl From<pssi_ai::Error> for ApiError {
    fn from(e: pssi_ai::Error) -> Self {
        match e {
            pssi_ai::Error::Validation(message) => ApiError::bad_request(message),
            pssi_ai::Error::NotConfigured(_) => ApiError::unavailable(e.to_string()),
            other => {
                tracing::error!("AI request failed: {}", other);
                ApiError::internal(other.to_string())
            }
        }
    }
}

impl From<pssi_core::Error> for ApiError {
    fn from(e: pssi_core::Error) -> Self {
        match e {
            pssi_core::Error::TaskNotFound(_) => ApiError::not_found("Task not found"),
            pssi_core::Error::EmptyDescription => ApiError::bad_request(e.to_string()),
            other => {
                tracing::error!("Task automation failed: {}", other);
                ApiError::internal(other.to_string())
            }
        }
    }
}

impl From<pssi_github::Error> for ApiError {
    fn from(e: pssi_github::Error) -> Self {
        match e {
            pssi_github::Error::InvalidAction(_) => ApiError::bad_request("Invalid action"),
            other => {
                tracing::error!("Source control request failed: {}", other);
                ApiError::internal(other.to_string())
            }
        }
    }
}

impl From<pssi_host::HostError> for ApiError {
    fn from(e: pssi_host::HostError) -> Self {
        tracing::error!("Host operation failed: {}", e);
        ApiError::internal(e.to_string())
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pssi_ai::ProviderKind;

    #[test]
    fn test_internal_error_shape() {
        let err = ApiError::internal("boom");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(Value::Object(err.body), json!({"success": false, "error": "boom"}));
    }

    #[test]
    fn test_ai_error_mapping() {
        let validation: ApiError = pssi_ai::Error::Validation("Prompt is required".into()).into();
        assert_eq!(validation.status, StatusCode::BAD_REQUEST);
        assert_eq!(validation.message(), "Prompt is required");

        let missing: ApiError = pssi_ai::Error::NotConfigured(ProviderKind::Gemini).into();
        assert_eq!(missing.status, StatusCode::SERVICE_UNAVAILABLE);

        let upstream: ApiError = pssi_ai::Error::Provider {
            provider: ProviderKind::OpenAI,
            status: 429,
            message: "Rate limit reached".into(),
        }
        .into();
        assert_eq!(upstream.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.message(), "Rate limit reached");
    }

    #[tokio::test]
    async fn test_host_error_is_internal() {
        let join_error = tokio::spawn(async { panic!("sensor read crashed") })
            .await
            .unwrap_err();
        let err: ApiError = pssi_host::HostError::from(join_error).into();

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body["success"], false);
        assert!(err.message().starts_with("Stats collection failed"));
    }

    #[test]
    fn test_task_not_found_mapping() {
        let err: ApiError = pssi_core::Error::TaskNotFound("task_1".into()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(Value::Object(err.body), json!({"error": "Task not found"}));
    }
}
