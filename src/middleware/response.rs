use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

/// Outcome marker carried in every envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

/// The uniform body returned by every endpoint, success or not:
/// `{ "status", "message", "data", "errors" }` with absent parts as `null`.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub status: EnvelopeStatus,
    pub message: String,
    pub data: Value,
    pub errors: Value,
}

impl Envelope {
    pub fn success(message: impl Into<String>, data: Value) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            message: message.into(),
            data,
            errors: Value::Null,
        }
    }

    pub fn error(message: impl Into<String>, errors: Value) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            message: message.into(),
            data: Value::Null,
            errors,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// Wrapper for successful API responses that adds the envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub message: String,
    pub data: Option<T>,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self::with_status(message, Some(data), StatusCode::OK)
    }

    /// Create an API response with custom status code
    pub fn with_status(message: impl Into<String>, data: Option<T>, status_code: StatusCode) -> Self {
        Self {
            message: message.into(),
            data,
            status_code,
        }
    }

    /// Create a 201 Created response
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::with_status(message, Some(data), StatusCode::CREATED)
    }
}

impl ApiResponse<()> {
    /// 200 with `data: null`
    pub fn message(message: impl Into<String>) -> Self {
        Self::with_status(message, None, StatusCode::OK)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let data_value = match self.data.map(|d| serde_json::to_value(&d)).transpose() {
            Ok(value) => value.unwrap_or(Value::Null),
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return Envelope::error("Failed to serialize response data", json!(e.to_string()))
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        Envelope::success(self.message, data_value).into_response_with(self.status_code)
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
