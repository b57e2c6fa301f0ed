use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Relay errors
#[derive(Error, Debug)]
pub enum RelayError {
    /// The request body is not a valid payload (400)
    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    /// Pub/Sub rejected or failed the publish call
    #[error("publish failed: {0}")]
    Publish(String),

    /// No access token could be obtained
    #[error("access token unavailable: {0}")]
    Token(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Decode(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            RelayError::Decode(err) => err.to_string(),
            other => format!("Could not publish message: {}", other),
        };
        tracing::warn!(status = %status, error = %self, "Request rejected");
        (status, body).into_response()
    }
}
