// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("MongoDB error: {0}")]
    MongoDB(#[from] mongodb::error::Error),

    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] mongodb::bson::ser::Error),

    #[error("Invalid ObjectId: {0}")]
    InvalidObjectId(String),

    #[error("Document not found")]
    DocumentNotFound,

    #[error("Match not found: {0}")]
    MatchNotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Error kind and message carried on error responses so the envelope
/// middleware can rebuild the body with the request path.
#[derive(Debug, Clone)]
pub struct ErrorEnvelope {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn to_json(&self, path: Option<&str>, method: Option<&str>) -> serde_json::Value {
        let mut body = json!({
            "success": false,
            "statusCode": self.status.as_u16(),
            "error": self.kind,
            "message": self.message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        if let Some(path) = path {
            body["path"] = json!(path);
        }
        if let Some(method) = method {
            body["method"] = json!(method);
        }
        body
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MongoDB(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BsonSerialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidObjectId(_) => StatusCode::BAD_REQUEST,
            AppError::DocumentNotFound => StatusCode::NOT_FOUND,
            AppError::MatchNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::ExternalApi(_) => StatusCode::BAD_GATEWAY,
            AppError::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::MongoDB(_) | AppError::BsonSerialization(_) => "DATABASE_ERROR",
            AppError::InvalidObjectId(_) | AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::DocumentNotFound | AppError::MatchNotFound(_) => "NOT_FOUND",
            AppError::Persistence(_) => "PERSISTENCE_ERROR",
            AppError::ExternalApi(_) => "EXTERNAL_API_ERROR",
            AppError::ConfigurationError(_) => "CONFIGURATION_ERROR",
            AppError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            status: self.status_code(),
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let envelope = self.envelope();

        if envelope.status.is_server_error() {
            tracing::error!("{} - {}", envelope.status, envelope.message);
        }

        let mut response = (envelope.status, Json(envelope.to_json(None, None))).into_response();
        response.extensions_mut().insert(envelope);
        response
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalApi(format!("HTTP request failed: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError(format!("JSON parsing error: {}", err))
    }
}

impl From<mongodb::bson::oid::Error> for AppError {
    fn from(err: mongodb::bson::oid::Error) -> Self {
        AppError::InvalidObjectId(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

// Helper conversion functions
impl AppError {
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn external_api(msg: impl Into<String>) -> Self {
        AppError::ExternalApi(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        AppError::Persistence(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::ConfigurationError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
