use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::{auth::SessionError, onboarding::SliceError, store::StoreError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Not found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Service unavailable")]
    Unavailable,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized  => "UNAUTHORIZED",
            AppError::Forbidden     => "FORBIDDEN",
            AppError::NotFound      => "NOT_FOUND",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Conflict(_)   => "CONFLICT",
            AppError::Unavailable   => "SERVICE_UNAVAILABLE",
            AppError::Internal(_)   => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized  => StatusCode::UNAUTHORIZED,
            AppError::Forbidden     => StatusCode::FORBIDDEN,
            AppError::NotFound      => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_)   => StatusCode::CONFLICT,
            AppError::Unavailable   => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_)   => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "Internal error");
                "An internal error occurred".to_owned()
            }
            other => other.to_string(),
        };
        let body = json!({ "error": message, "code": self.code() });
        (self.status(), Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) | StoreError::MissingParent(_) => AppError::Conflict(err.to_string()),
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Unavailable => AppError::Unavailable,
            SessionError::Expired | SessionError::Rejected(_) => AppError::Unauthorized,
        }
    }
}

impl From<SliceError> for AppError {
    fn from(err: SliceError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_maps_to_conflict() {
        let err = AppError::from(StoreError::Duplicate("profile"));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "profile already exists");
    }

    #[test]
    fn missing_parent_row_maps_to_conflict() {
        let err = AppError::from(StoreError::MissingParent("student profile"));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "student profile does not exist yet");
    }

    #[test]
    fn database_errors_are_internal() {
        let err = AppError::from(StoreError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn session_errors_map_to_401_or_503() {
        assert_eq!(AppError::from(SessionError::Unavailable).status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(AppError::from(SessionError::Expired).status(), StatusCode::UNAUTHORIZED);
    }
}
