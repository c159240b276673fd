use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    RateLimited,
    Unavailable,
    Internal,
}

impl ErrorCode {
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::Validation,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            502..=504 => Self::Unavailable,
            _ => Self::Internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Error body returned by the generative text provider: `{"error": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderErrorEnvelope {
    pub error: ProviderErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderErrorBody {
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl From<ProviderErrorBody> for ApiError {
    fn from(value: ProviderErrorBody) -> Self {
        let message = match value.status {
            Some(status) => format!("{status}: {}", value.message),
            None => value.message,
        };
        Self {
            code: ErrorCode::from_http_status(value.code),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_body_maps_status_into_code_and_message() {
        let raw = r#"{"error":{"code":429,"message":"quota exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        let envelope: ProviderErrorEnvelope = serde_json::from_str(raw).expect("envelope");
        let err = ApiError::from(envelope.error);

        assert_eq!(err.code, ErrorCode::RateLimited);
        assert_eq!(err.message, "RESOURCE_EXHAUSTED: quota exhausted");
        assert_eq!(err.to_string(), "RateLimited: RESOURCE_EXHAUSTED: quota exhausted");
    }

    #[test]
    fn unknown_status_is_internal() {
        assert_eq!(ErrorCode::from_http_status(500), ErrorCode::Internal);
        assert_eq!(ErrorCode::from_http_status(503), ErrorCode::Unavailable);
    }
}
