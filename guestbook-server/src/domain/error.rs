use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    /// Ownership check failed or the record does not exist. Anonymous mutation
    /// paths collapse both into this one error so a caller cannot learn
    /// whether a record exists.
    #[error("denied")]
    Denied,
    /// Admin paths only; the caller is trusted so the id may be echoed.
    #[error("not found: {0}")]
    NotFound(Uuid),
    #[error("email already in use: {0}")]
    EmailTaken(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::Validation(_) | DomainError::EmailTaken(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            DomainError::Denied => StatusCode::FORBIDDEN,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
            DomainError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        let details = match self {
            DomainError::Validation(errors) => Some(json!({ "fields": errors })),
            DomainError::NotFound(id) => Some(json!({ "resource": id })),
            DomainError::EmailTaken(email) => Some(json!({ "email": email })),
            DomainError::Storage(_) => Some(json!({ "retryable": true })),
            _ => None,
        };
        let body = ErrorBody {
            error: message.as_str(),
            details,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
