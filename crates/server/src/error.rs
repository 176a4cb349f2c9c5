//! Error type shared by every handler, rendered as `{"error", "message"}` JSON.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use tally_core::{DurationError, InvalidRoleError, PermissionDenied, SubmissionError};

use crate::db::RepositoryError;

/// Application-level error type for request handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Storage failure the client cannot act on.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// A role string was not one of the known roles.
    #[error(transparent)]
    InvalidRole(#[from] InvalidRoleError),

    /// A duration was malformed or out of range.
    #[error(transparent)]
    Duration(#[from] DurationError),

    /// A submitted timesheet had nothing to save.
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    /// Caller's role is too low.
    #[error("Forbidden: {0}")]
    PermissionDenied(#[from] PermissionDenied),

    /// Caller is authenticated but the action is not theirs to take.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated, or not a member of any company.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The target exists but is in the wrong state (used invite, approved entry).
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("resource not found".to_owned()),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Database(other),
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRole(_) | Self::Duration(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Submission(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PermissionDenied(_) | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Database(_) | Self::Internal(_) => "internal",
            Self::InvalidRole(_) => "invalid_role",
            Self::Duration(_) => "invalid_duration",
            Self::Submission(_) => "no_valid_entries",
            Self::PermissionDenied(_) | Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::Conflict(_) => "conflict",
            Self::BadRequest(_) => "bad_request",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let server_side = matches!(self, Self::Database(_) | Self::Internal(_));
        let message = if server_side {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "request failed");
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };

        let body = json!({ "error": self.code(), "message": message });
        (self.status(), Json(body)).into_response()
    }
}

/// Tag subsequent Sentry events in this scope with the calling member.
pub fn set_sentry_user(member_id: i32, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(member_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
mod tests {
    use tally_core::Role;

    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_messages_name_the_problem() {
        let err = AppError::NotFound("project 12".to_string());
        assert_eq!(err.to_string(), "Not found: project 12");

        let err = AppError::from(PermissionDenied {
            required: Role::Manager,
        });
        assert_eq!(err.to_string(), "Forbidden: requires manager role");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::from(PermissionDenied {
                required: Role::Admin
            })),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::from(InvalidRoleError("owner".to_string()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::from(DurationError::InvalidFormat("8".to_string()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::from(SubmissionError::NoValidEntries)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors_map_to_client_errors() {
        assert_eq!(
            status_of(AppError::from(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::from(RepositoryError::Conflict("dup".to_string()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::from(RepositoryError::DataCorruption("x".to_string()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
