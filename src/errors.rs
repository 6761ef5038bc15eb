use crate::models::FieldErrors;
use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Failures reported by the remote client and the mutation coordinator.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered 401; the session is missing, invalid or expired.
    #[error("not authorized")]
    Unauthorized,

    /// Local required-field check; never reaches the network.
    #[error("validation failed: {0}")]
    ValidationFailed(FieldErrors),

    /// Any other non-2xx answer, with the server's error payload when present.
    #[error("request failed with status {status}")]
    RequestFailed { status: u16, detail: Option<Value> },

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// A 2xx answer whose body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::ValidationFailed(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized => "Your session has expired, please sign in again".to_string(),
            ApiError::ValidationFailed(errors) => format!("Please fix the form: {errors}"),
            ApiError::RequestFailed { status, detail } => match detail.as_ref().and_then(describe_detail) {
                Some(text) => format!("The server rejected the request: {text}"),
                None => format!("The server rejected the request (status {status})"),
            },
            ApiError::ConnectionFailed(_) => "Could not connect to the server".to_string(),
            ApiError::InvalidResponse(_) => "The server sent an unexpected response".to_string(),
        }
    }
}

/// Flattens the error payloads the backend uses (`{"detail": ".."}`, field
/// maps such as `{"email": ["invalid"]}`, bare strings) into one line.
fn describe_detail(detail: &Value) -> Option<String> {
    match detail {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(describe_detail).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        Value::Object(map) => {
            if let Some(text) = map.get("detail").and_then(describe_detail) {
                return Some(text);
            }
            let parts: Vec<String> = map
                .iter()
                .filter_map(|(field, value)| describe_detail(value).map(|text| format!("{field}: {text}")))
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        let status = match &err {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::RequestFailed { .. } | ApiError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
            ApiError::ConnectionFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self {
            status,
            message: err.user_message(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
