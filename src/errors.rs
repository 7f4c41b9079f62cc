// src/errors.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, Error)]
pub enum AppError {
    // Database errors
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Auth errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid token")]
    InvalidToken,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

fn pg_code(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}

// Foreign-key violations mean the request named a row that does not exist.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if pg_code(&err).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
            return AppError::Validation("Referenced record does not exist".to_string());
        }
        AppError::Database(err)
    }
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Turns a unique-constraint violation into a 409 carrying `message`;
    /// every other database error goes through the usual `From` mapping.
    pub fn conflict_on_unique(err: sqlx::Error, message: impl Into<String>) -> Self {
        if pg_code(&err).as_deref() == Some(UNIQUE_VIOLATION) {
            AppError::Conflict(message.into())
        } else {
            AppError::from(err)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        }
        // Database internals stay in the log, not in the response.
        let message = match &self {
            AppError::Database(_) => "Database error".to_string(),
            other => other.to_string(),
        };
        let body = json!({
            "error": {
                "code": status.as_u16(),
                "message": message,
            }
        });
        (status, Json(body)).into_response()
    }
}

// Convenience alias
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::{borrow::Cow, error::Error as StdError, fmt};

    #[derive(Debug)]
    struct PgError(&'static str);

    impl fmt::Display for PgError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "constraint violated ({})", self.0)
        }
    }

    impl StdError for PgError {}

    impl DatabaseError for PgError {
        fn message(&self) -> &str {
            "constraint violated"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    fn pg_error(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(PgError(code)))
    }

    #[test]
    fn maps_variants_to_status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Database(sqlx::Error::RowNotFound), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn non_database_errors_are_not_turned_into_conflicts() {
        let err = AppError::conflict_on_unique(sqlx::Error::RowNotFound, "duplicate");
        assert!(matches!(err, AppError::Database(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn foreign_key_violation_is_a_bad_request() {
        let err = AppError::from(pg_error("23503"));
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn foreign_key_violation_on_insert_is_not_a_conflict() {
        let err = AppError::conflict_on_unique(pg_error("23503"), "duplicate");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let err = AppError::conflict_on_unique(pg_error("23505"), "duplicate");
        assert!(matches!(err, AppError::Conflict(ref m) if m == "duplicate"));
    }

    #[test]
    fn other_constraint_errors_stay_server_errors() {
        let err = AppError::from(pg_error("23514"));
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
