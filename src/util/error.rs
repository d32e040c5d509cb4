use axum::{http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use tracing::error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::model::DomainError;
use crate::repository::repository_error::RepositoryError;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum HandlerErrorKind {
    NotFound,
    Validation,
    Internal,
    Unauthorized,
    Forbidden,
    Conflict,
    BadRequest,
}

impl std::fmt::Display for HandlerErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HandlerErrorKind::NotFound => "NotFound",
            HandlerErrorKind::Validation => "Validation",
            HandlerErrorKind::Internal => "Internal",
            HandlerErrorKind::Unauthorized => "Unauthorized",
            HandlerErrorKind::Forbidden => "Forbidden",
            HandlerErrorKind::Conflict => "Conflict",
            HandlerErrorKind::BadRequest => "BadRequest",
        };
        write!(f, "{}", s)
    }
}

/// One offending request field
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HandlerError {
    pub error: HandlerErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl HandlerError {
    pub fn new(error: HandlerErrorKind, message: impl Into<String>) -> Self {
        HandlerError { error, message: message.into(), errors: None }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(HandlerErrorKind::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(HandlerErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(HandlerErrorKind::Forbidden, message)
    }

    /// 400 carrying a single field complaint
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        HandlerError {
            error: HandlerErrorKind::Validation,
            message: "Validation failed".to_string(),
            errors: Some(vec![FieldError { field: field.into(), message }]),
        }
    }

    pub fn internal(detail: impl std::fmt::Display) -> Self {
        error!("Internal error: {}", detail);
        Self::new(HandlerErrorKind::Internal, "Server error")
    }

    pub fn status(&self) -> StatusCode {
        match self.error {
            HandlerErrorKind::NotFound => StatusCode::NOT_FOUND,
            HandlerErrorKind::Validation | HandlerErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            HandlerErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            HandlerErrorKind::Forbidden => StatusCode::FORBIDDEN,
            HandlerErrorKind::Conflict => StatusCode::CONFLICT,
            HandlerErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for HandlerError {}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, axum::Json(self)).into_response()
    }
}

impl From<ValidationErrors> for HandlerError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = Vec::new();
        collect_field_errors("", &errors, &mut fields);
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        HandlerError {
            error: HandlerErrorKind::Validation,
            message: "Validation failed".to_string(),
            errors: Some(fields),
        }
    }
}

fn collect_field_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let name = camel_case(&field.to_string());
        let path = if prefix.is_empty() { name } else { format!("{}.{}", prefix, name) };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for e in list {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", e.code));
                    out.push(FieldError { field: path.clone(), message });
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_field_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    collect_field_errors(&format!("{}[{}]", path, idx), inner, out);
                }
            }
        }
    }
}

fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    NotFound(String),
    InvalidInput(String),
    Unauthorized(String),
    Forbidden(String),
    InternalError(String),
    Conflict(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ServiceError::InvalidInput(msg) => write!(f, "Invalid Input: {}", msg),
            ServiceError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ServiceError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ServiceError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
            ServiceError::Conflict(msg) => write!(f, "Conflict: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ServiceError::InvalidInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ServiceError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ServiceError::Forbidden(msg.into())
    }

    pub fn internal(msg: impl std::fmt::Display) -> Self {
        ServiceError::InternalError(msg.to_string())
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => ServiceError::NotFound(msg),
            RepositoryError::ValidationError(msg) => ServiceError::InvalidInput(msg),
            RepositoryError::AlreadyExists(msg) => ServiceError::Conflict(msg),
            RepositoryError::DatabaseError(msg)
            | RepositoryError::ConnectionError(msg)
            | RepositoryError::SerializationError(msg) => ServiceError::InternalError(msg),
            RepositoryError::Generic(e) => ServiceError::InternalError(e.to_string()),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::CommentNotFound | DomainError::ApplicationNotFound => {
                ServiceError::NotFound(err.to_string())
            }
            other => ServiceError::InvalidInput(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::InternalError(format!("JSON shaping error: {}", err))
    }
}

impl From<ServiceError> for HandlerError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => HandlerError::new(HandlerErrorKind::NotFound, msg),
            ServiceError::InvalidInput(msg) => HandlerError::bad_request(msg),
            ServiceError::Unauthorized(msg) => HandlerError::unauthorized(msg),
            ServiceError::Forbidden(msg) => HandlerError::forbidden(msg),
            ServiceError::Conflict(msg) => HandlerError::new(HandlerErrorKind::Conflict, msg),
            ServiceError::InternalError(msg) => HandlerError::internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1, message = "Title is required"))]
        title: String,
        #[validate(range(min = 1))]
        max_guests: u32,
    }

    #[test]
    fn test_validation_errors_are_flattened() {
        let probe = Probe { title: String::new(), max_guests: 0 };
        let err = HandlerError::from(probe.validate().unwrap_err());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let fields = err.errors.unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "maxGuests");
        assert_eq!(fields[1], FieldError { field: "title".into(), message: "Title is required".into() });
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = HandlerError::from(ServiceError::InternalError("connection reset by peer".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Server error");
    }

    #[test]
    fn test_service_error_status_mapping() {
        assert_eq!(HandlerError::from(ServiceError::forbidden("Access denied")).status(), StatusCode::FORBIDDEN);
        assert_eq!(HandlerError::from(ServiceError::not_found("Event not found")).status(), StatusCode::NOT_FOUND);
        assert_eq!(HandlerError::from(ServiceError::invalid("Event is full")).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            HandlerError::from(ServiceError::Unauthorized("Invalid credentials".into())).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_domain_errors_map_to_client_errors() {
        assert_eq!(
            ServiceError::from(DomainError::EventFull),
            ServiceError::InvalidInput("Event is full".into())
        );
        assert_eq!(
            ServiceError::from(DomainError::CommentNotFound),
            ServiceError::NotFound("Comment not found".into())
        );
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("graduation_year"), "graduationYear");
        assert_eq!(camel_case("title"), "title");
        assert_eq!(camel_case("__all__"), "all");
    }
}
