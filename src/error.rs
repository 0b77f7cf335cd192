use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Failures coming out of the SQLite layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("no user registered for {0}")]
    UnknownUser(String),

    #[error("corrupt row in {table}: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    #[error("timestamp out of range: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// A single (dining hall, meal) request against the menu API that went wrong.
#[derive(Error, Debug)]
pub enum MenuFetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("menu api answered {status}")]
    Status { status: u16 },

    #[error("invalid menu payload: {0}")]
    Decode(String),
}

/// A serialized preference list that could not be read back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed list column: {0}")]
pub struct ListDecodeError(pub String);

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(StorageError::UnknownUser(_)) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_user_maps_to_not_found() {
        let res = ApiError::from(StorageError::UnknownUser("a@b.edu".into())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn database_errors_are_redacted_as_internal() {
        let res = ApiError::from(StorageError::Database(sqlx::Error::PoolTimedOut)).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
