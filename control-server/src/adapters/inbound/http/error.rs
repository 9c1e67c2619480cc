use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::TriggerError;

/// JSON error body shared by every endpoint: `{"success":false,"error":...}`
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,

    success: bool,

    /// Short human-readable description
    pub error: String,

    /// Requested path (404 only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Methods the path accepts (405 only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_methods: Option<Vec<String>>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            success: false,
            error: error.into(),
            path: None,
            allowed_methods: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Unknown path (404 Not Found)
    pub fn not_found(path: impl Into<String>) -> Self {
        let mut error = Self::new(StatusCode::NOT_FOUND, "Not found");
        error.path = Some(path.into());
        error
    }

    /// Known path, unsupported method (405 Method Not Allowed)
    pub fn method_not_allowed(allowed: &[&str]) -> Self {
        let mut error = Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
        error.allowed_methods = Some(allowed.iter().map(|m| m.to_string()).collect());
        error
    }

    /// Malformed or missing input (400 Bad Request)
    pub fn validation_error(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    /// Operation already running (409 Conflict)
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, detail)
    }

    /// Supervisor or remote peer failure (502 Bad Gateway)
    pub fn bad_gateway(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let allow = self.allowed_methods.as_ref().map(|methods| methods.join(", "));
        let mut response = (self.status, Json(self)).into_response();

        if let Some(allow) = allow.and_then(|allow| HeaderValue::from_str(&allow).ok()) {
            response.headers_mut().insert(header::ALLOW, allow);
        }

        response
    }
}

impl From<TriggerError> for ApiError {
    fn from(error: TriggerError) -> Self {
        match error {
            TriggerError::Validation(e) => {
                tracing::debug!("Trigger rejected: {}", e);
                Self::validation_error(e.to_string())
            }
            TriggerError::Supervisor(e) => Self::bad_gateway(e.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
