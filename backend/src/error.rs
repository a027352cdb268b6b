//! Error handling for the Kitchen Stock back office
//!
//! Every failure becomes `{ "success": false, "error": "...", "code": "..." }`
//! with a status code chosen by variant, never by message text.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::DomainError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Não autorizado: {0}")]
    Unauthorized(String),

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    // Validation errors
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    // Business logic errors
    #[error("{0}")]
    InvalidStateTransition(String),

    // External service errors
    #[error("Serviço externo indisponível: {0}")]
    ExternalService(String),

    #[error("Falha no armazenamento: {0}")]
    StorageError(String),

    #[error("Processamento excedeu o tempo limite de {0} segundos")]
    PipelineTimeout(u64),

    #[error("Erro de configuração: {0}")]
    Configuration(String),

    // Database errors
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Erro interno: {0}")]
    Internal(String),

    #[error("Erro interno do servidor")]
    InternalError(#[from] anyhow::Error),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => AppError::ValidationError(msg),
            DomainError::InvalidState(msg) => AppError::InvalidStateTransition(msg),
            DomainError::NotFound(msg) => AppError::NotFound(msg),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let Some((field, errs)) = field_errors.iter().min_by_key(|(field, _)| **field) else {
            return AppError::ValidationError("Dados inválidos".to_string());
        };
        let message = errs
            .iter()
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| format!("Campo inválido: {}", field));
        AppError::Validation {
            field: field.to_string(),
            message,
        }
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: &'static str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code,
            field: None,
        }
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::Validation { .. } | AppError::ValidationError(_) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::InvalidStateTransition(_) => {
                (StatusCode::CONFLICT, "INVALID_STATE_TRANSITION")
            }
            AppError::ExternalService(_) => (StatusCode::BAD_GATEWAY, "EXTERNAL_SERVICE_ERROR"),
            AppError::StorageError(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_ERROR"),
            AppError::PipelineTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, "PIPELINE_TIMEOUT"),
            AppError::Configuration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR")
            }
            AppError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::Internal(_) | AppError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }

    /// Message safe to show to the caller
    fn public_message(&self) -> String {
        match self {
            AppError::DatabaseError(_) => "Erro ao acessar o banco de dados".to_string(),
            AppError::InternalError(_) => "Erro interno do servidor".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!("Request rejected ({}): {}", code, self);
        }

        let body = ErrorResponse {
            success: false,
            error: self.public_message(),
            code,
            field: match &self {
                AppError::Validation { field, .. } => Some(field.clone()),
                _ => None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::validation("x"), StatusCode::BAD_REQUEST),
            (DomainError::invalid_state("x"), StatusCode::CONFLICT),
            (DomainError::not_found("x"), StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status_and_code().0, status);
        }
    }

    #[test]
    fn test_database_details_are_hidden() {
        let err = AppError::DatabaseError(sqlx::Error::RowNotFound);
        assert_eq!(err.public_message(), "Erro ao acessar o banco de dados");
    }

    #[derive(validator::Validate)]
    struct Signup {
        #[validate(email(message = "Email inválido"))]
        email: String,
        #[validate(length(min = 6))]
        password: String,
    }

    #[test]
    fn test_validator_message_is_surfaced() {
        use validator::Validate;

        let err: AppError = Signup {
            email: "sem-arroba".into(),
            password: "123456".into(),
        }
        .validate()
        .unwrap_err()
        .into();
        assert_eq!(err.public_message(), "Email inválido");

        // Fields without a custom message fall back to the field name
        let err: AppError = Signup {
            email: "chef@cozinha.com.br".into(),
            password: "123".into(),
        }
        .validate()
        .unwrap_err()
        .into();
        assert_eq!(err.public_message(), "Campo inválido: password");
    }

    #[test]
    fn test_validation_message_is_kept() {
        let err = AppError::ValidationError("Foto da nota fiscal é obrigatória".into());
        assert_eq!(err.public_message(), "Foto da nota fiscal é obrigatória");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
