//! Service-specific error types

use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Errors a handler cannot recover from.
///
/// Validation failures are not here: handlers answer those with a view.
#[derive(Error, Debug)]
pub enum Error {
    /// The claim journey reached a page that needs the organisation before
    /// sign-in stored one.
    #[error("Organisation not in session.")]
    OrganisationNotInSession,

    #[error("failed to build sign-in url: {0}")]
    SignIn(#[from] defra_id_auth::Error),
}

/// Result alias using service Error
pub type Result<T> = std::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(CONTENT_TYPE, "application/json")],
            serde_json::json!({ "error": self.to_string() }).to_string(),
        )
            .into_response()
    }
}
