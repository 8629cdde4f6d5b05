//! Error types for credential lifecycle operations.

use std::io;
use std::path::PathBuf;

/// Result type alias for credential lifecycle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Credential lifecycle error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// `OAuth2` error from the authorization server.
    #[error("OAuth2 error: {error} - {description}")]
    OAuth {
        /// Error code (e.g., `invalid_grant`).
        error: String,
        /// Human-readable description.
        description: String,
    },

    /// User denied authorization.
    #[error("User denied authorization")]
    AccessDenied,

    /// No refresh token available.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// No client configuration could be resolved.
    #[error(
        "no OAuth client configuration found; set GOOGLE_CLIENT_ID and \
         GOOGLE_CLIENT_SECRET in the environment, or place a client \
         credentials file at {}",
        .credentials_path.display()
    )]
    ConfigMissing {
        /// Path where the credentials file was expected.
        credentials_path: PathBuf,
    },

    /// Malformed or unexpected redirect callback.
    #[error("Invalid authorization callback: {0}")]
    InvalidCallback(String),

    /// Credential is structurally unusable (e.g., empty access token).
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// Mail API request was rejected.
    #[error("Gmail API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the API error envelope.
        message: String,
    },
}

impl Error {
    /// Creates an `OAuth2` error from error code and description.
    #[must_use]
    pub fn oauth_error(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self::OAuth {
            error: error.into(),
            description: description.into(),
        }
    }
}
