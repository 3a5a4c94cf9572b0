use crate::error::ApiError;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A field that must be present, non-null and non-empty, with the message
/// returned when it is not.
pub type Required = (&'static str, &'static str);

/// A typed request body with its required fields declared up front.
pub trait RequestSchema: DeserializeOwned {
    const REQUIRED: &'static [Required] = &[];
}

/// Extractor that validates the declared required fields before
/// deserializing into `T`.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Payload<T>
where
    T: RequestSchema,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        let object = parse_object(&bytes)?;
        check_required(&object, T::REQUIRED)?;

        serde_json::from_value(Value::Object(object))
            .map(Payload)
            .map_err(|e| ApiError::bad_request(format!("Invalid request: {}", e)))
    }
}

/// Parse a body as a JSON object; an empty body is `{}`.
pub fn parse_object(bytes: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(ApiError::bad_request("Request body must be a JSON object")),
        Err(e) => Err(ApiError::bad_request(format!("Invalid JSON body: {}", e))),
    }
}

pub fn check_required(object: &Map<String, Value>, required: &[Required]) -> Result<(), ApiError> {
    for (field, message) in required {
        let present = match object.get(*field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };
        if !present {
            return Err(ApiError::bad_request(*message));
        }
    }
    Ok(())
}
