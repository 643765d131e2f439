use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use cadastre_core::{CadastreError, HOST_UNRESOLVED_MESSAGE};
use cadastre_model::{ErrorResponse, ModelError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl AppError {
    pub fn new(
        status: StatusCode,
        kind: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "ValidationError", message)
    }

    pub fn resource_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found")
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "Conflict", message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "ServiceUnavailable",
            message,
        )
    }

    pub fn host_unresolved() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "ConnectionRefusedError",
            HOST_UNRESOLVED_MESSAGE,
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "InternalError", message)
    }

    pub fn body(&self) -> ErrorResponse {
        ErrorResponse::new(self.status.as_u16(), self.kind, &self.message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = self.status.as_u16(),
                kind = self.kind,
                "request failed: {}",
                self.message
            );
        }

        (self.status, Json(self.body())).into_response()
    }
}

impl From<CadastreError> for AppError {
    fn from(err: CadastreError) -> Self {
        match err {
            CadastreError::Validation(msg) => Self::validation(msg),
            CadastreError::Unavailable(msg) => Self::unavailable(msg),
            CadastreError::HostUnresolved(_) => Self::host_unresolved(),
            CadastreError::Conflict(msg) => Self::conflict(msg),
            CadastreError::NotFound(_) => Self::resource_not_found(),
            CadastreError::Scoring(msg) | CadastreError::Internal(msg) => {
                Self::internal(msg)
            }
        }
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}
