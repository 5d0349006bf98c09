use crate::assignments::{AssignmentServiceError, ImportError, RejectionReason, StoreError};
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Store(StoreError),
    Import(ImportError),
    Assignment(AssignmentServiceError),
    Rejected(RejectionReason),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Store(err) => write!(f, "store error: {}", err),
            AppError::Import(err) => write!(f, "import error: {}", err),
            AppError::Assignment(err) => write!(f, "assignment not recorded: {}", err),
            AppError::Rejected(reason) => write!(f, "assignment rejected: {}", reason.code()),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Assignment(err) => Some(err),
            AppError::Rejected(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Import(ImportError::Csv { .. })
            | AppError::Assignment(AssignmentServiceError::InvalidRequest(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Assignment(AssignmentServiceError::UnknownCourse(_)) => StatusCode::NOT_FOUND,
            AppError::Assignment(AssignmentServiceError::DuplicateAssignment { .. }) => {
                StatusCode::CONFLICT
            }
            AppError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Store(StoreError::Unavailable(_))
            | AppError::Import(ImportError::Store(StoreError::Unavailable(_)))
            | AppError::Assignment(AssignmentServiceError::Store(StoreError::Unavailable(_))) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Store(_)
            | AppError::Import(_)
            | AppError::Assignment(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ImportError> for AppError {
    fn from(value: ImportError) -> Self {
        Self::Import(value)
    }
}

impl From<AssignmentServiceError> for AppError {
    fn from(value: AssignmentServiceError) -> Self {
        match value {
            AssignmentServiceError::Store(err) => Self::Store(err),
            other => Self::Assignment(other),
        }
    }
}
