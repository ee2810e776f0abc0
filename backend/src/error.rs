use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Failure kinds surfaced by the store and search layers. Every variant is
/// returned to the boundary layer; none are retried or swallowed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Missing or malformed fields on create, or an unparseable filter.
    #[error("{0}")]
    InvalidInput(String),

    /// Unknown listing id, or a user with no records at all.
    #[error("{0}")]
    NotFound(String),

    /// Requester is not the listing's owner.
    #[error("user does not have permission to update this listing")]
    Forbidden,

    /// Shortlisting a listing that has already been sold.
    #[error("listing '{0}' is already sold")]
    AlreadySold(String),

    /// A secondary index diverged from the listing table. Triggers rollback
    /// on create; fatal on status updates.
    #[error("failed to update indices: {0}")]
    IndexUpdateFailure(String),
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = match self {
            StoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Forbidden => StatusCode::FORBIDDEN,
            StoreError::AlreadySold(_) => StatusCode::CONFLICT,
            StoreError::IndexUpdateFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
