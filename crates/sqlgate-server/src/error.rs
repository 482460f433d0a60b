//! Error types for the facade.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sqlgate_policy::PolicyError;
use thiserror::Error;

/// Errors that can occur while serving gateway requests.
#[derive(Debug, Error)]
pub enum FacadeError {
    /// No such target, user, or stored result.
    #[error("not found")]
    NotFound,

    /// Login failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The policy kernel rejected the query.
    #[error("{0}")]
    Policy(#[from] PolicyError),

    /// The history database rejected a duplicate row.
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// Database error against a target or the internal storage.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration problem detected at startup.
    #[error("configuration error: {0}")]
    Config(#[from] sqlgate_core::config::ConfigError),

    /// Listener setup failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for FacadeError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            FacadeError::NotFound => (StatusCode::NOT_FOUND, "not found".to_owned()),
            FacadeError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid credentials".to_owned())
            }
            // Schema failures collapse into the same body as rule denials so
            // clients cannot probe for undeclared columns.
            FacadeError::Policy(err) if err.is_access_denied() => {
                tracing::warn!(error = %err, "query denied");
                (StatusCode::FORBIDDEN, "access denied".to_owned())
            }
            FacadeError::Policy(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            FacadeError::Integrity(_) => (StatusCode::CONFLICT, "conflict".to_owned()),
            FacadeError::Database(err) => {
                tracing::error!(error = %err, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_owned())
            }
            FacadeError::Config(err) => {
                tracing::error!(error = %err, "configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_owned())
            }
            FacadeError::Io(err) => {
                tracing::error!(error = %err, "io error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_owned())
            }
            FacadeError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_owned())
            }
        };

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denials_share_one_status() {
        // Unknown columns and rule denials must be indistinguishable.
        let schema = sqlgate_policy::DbSchema::new("public", Vec::new());
        let err = sqlgate_policy::is_allowed(&schema, |_| true, "select id from t").unwrap_err();
        let response = FacadeError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn bad_queries_are_client_errors() {
        let schema = sqlgate_policy::DbSchema::new("public", Vec::new());
        let err = sqlgate_policy::is_allowed(&schema, |_| true, "not sql at all").unwrap_err();
        let response = FacadeError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
