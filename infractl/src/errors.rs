use crate::db::errors::DbError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided, or credentials rejected
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// The caller's role does not grant the feature identifier gating this action
    #[error("Use of {identifier} is forbidden")]
    InsufficientPermissions { identifier: String },

    /// Authorization denied for a reason other than a missing feature
    #[error("{message}")]
    Forbidden { message: String },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("Couldn't find {resource} with 'id'={id}")]
    NotFound { resource: String, id: String },

    /// Model-level validation failure, field messages joined into one string
    #[error("{message}")]
    Unprocessable { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Body of every error response: `{"error": {"kind": ..., "message": ...}}`.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
}

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest { message: message.into() }
    }

    pub fn not_found(resource: impl Into<String>, id: impl ToString) -> Self {
        Error::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::InsufficientPermissions { .. } | Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::ProtectedEntity { .. } => StatusCode::FORBIDDEN,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The `kind` tag of the error envelope, derived from the status code.
    pub fn kind(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "bad_request",
            StatusCode::UNAUTHORIZED => "unauthorized",
            StatusCode::FORBIDDEN => "forbidden",
            StatusCode::NOT_FOUND => "not_found",
            StatusCode::UNPROCESSABLE_ENTITY => "unprocessable_entity",
            _ => "internal_server_error",
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::InsufficientPermissions { identifier } => format!("Use of {identifier} is forbidden"),
            Error::Forbidden { message } => message.clone(),
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("Couldn't find {resource} with 'id'={id}"),
            Error::Unprocessable { message } => message.clone(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => match (table.as_deref(), constraint.as_deref()) {
                    (Some("users"), Some(c)) if c.contains("userid") => "Userid has already been taken".to_string(),
                    (Some("users"), Some(c)) if c.contains("email") => "Email has already been taken".to_string(),
                    (Some("groups"), _) => "Description has already been taken".to_string(),
                    (Some("tenants"), _) => "Name should be unique per parent".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::ProtectedEntity { reason, .. } => reason.clone(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::InsufficientPermissions { .. } | Error::Forbidden { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } | Error::Unprocessable { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let body = ErrorBody {
            error: ErrorDetail {
                kind: self.kind().to_string(),
                message: self.user_message(),
            },
        };

        (self.status_code(), Json(body)).into_response()
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Database(err.into())
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_follow_status() {
        assert_eq!(Error::bad_request("nope").kind(), "bad_request");
        assert_eq!(Error::not_found("user", 7).kind(), "not_found");
        assert_eq!(
            Error::InsufficientPermissions {
                identifier: "groups_create".to_string()
            }
            .kind(),
            "forbidden"
        );
        assert_eq!(Error::Unauthenticated { message: None }.kind(), "unauthorized");
        assert_eq!(
            Error::Database(DbError::ProtectedEntity {
                entity_type: "group".to_string(),
                entity_id: Some("3".to_string()),
                reason: "A tenant default group can not be deleted".to_string(),
            })
            .kind(),
            "forbidden"
        );
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let err = Error::Other(anyhow::anyhow!("connection refused at 10.0.0.3"));
        assert_eq!(err.user_message(), "Internal server error");
        assert_eq!(err.kind(), "internal_server_error");
    }

    #[test]
    fn test_not_found_message_names_resource() {
        let err = Error::not_found("group", 999_999);
        assert_eq!(err.user_message(), "Couldn't find group with 'id'=999999");
    }
}
