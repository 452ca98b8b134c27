use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{sqlx, DbErr, RuntimeErr};
use serde_json::json;
use thiserror::Error;

use crate::geocoding::GeocodingError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Client errors are covered by the request log
        match &self {
            AppError::Unavailable(msg) => tracing::warn!(error = %msg, "Upstream unavailable"),
            AppError::Internal(msg) => tracing::error!(error = %msg, "Internal error"),
            _ => {}
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Driver errors that mean the database could not be reached, as opposed to
/// a statement it rejected
fn is_connectivity_error(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::WorkerCrashed
    )
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => {
                AppError::Unavailable(format!("City store unavailable: {}", err))
            }
            DbErr::Query(RuntimeErr::SqlxError(ref e)) | DbErr::Exec(RuntimeErr::SqlxError(ref e))
                if is_connectivity_error(e) =>
            {
                AppError::Unavailable(format!("City store unavailable: {}", err))
            }
            DbErr::RecordNotFound(msg) => AppError::NotFound(msg),
            other => AppError::Internal(format!("Database error: {}", other)),
        }
    }
}

impl From<GeocodingError> for AppError {
    fn from(err: GeocodingError) -> Self {
        match err {
            GeocodingError::NotFound(_) => AppError::NotFound(err.to_string()),
            GeocodingError::Unavailable(_) => AppError::Unavailable(err.to_string()),
        }
    }
}
