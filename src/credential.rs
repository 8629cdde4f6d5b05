//! Credential type and token endpoint payloads.

use crate::error::{Error, Result};
use crate::scope::ScopeSet;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Expiry buffer: a token this close to expiring is treated as expired so it
/// is not handed out mid-request.
const EXPIRY_BUFFER_SECS: i64 = 60;

/// An `OAuth2` credential bound to a fixed scope set.
///
/// Created either by loading the persisted token artifact or by completing a
/// refresh or authorization exchange. Serializes to the on-disk artifact
/// format wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Access token string.
    pub access_token: String,
    /// Token type (usually "Bearer").
    pub token_type: String,
    /// Expiration time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Refresh token for obtaining new access tokens without user
    /// interaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Scopes this credential was authorized for.
    pub scopes: ScopeSet,
}

impl Credential {
    /// Creates a credential with the given access token and scopes.
    #[must_use]
    pub fn new(access_token: impl Into<String>, scopes: ScopeSet) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            expires_at: None,
            refresh_token: None,
            scopes,
        }
    }

    /// Builds a credential from a token endpoint response.
    ///
    /// `expires_in` is converted to an absolute timestamp. When the server
    /// echoes the granted scope string it takes precedence over `requested`,
    /// since the grant may differ from the request.
    #[must_use]
    pub fn from_response(response: TokenResponse, requested: &ScopeSet) -> Self {
        let expires_at = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(i64::from(secs)));

        let scopes = response
            .scope
            .as_deref()
            .map_or_else(|| requested.clone(), ScopeSet::from_granted);

        Self {
            access_token: response.access_token,
            token_type: response.token_type,
            expires_at,
            refresh_token: response.refresh_token,
            scopes,
        }
    }

    /// Checks if the credential is expired (with a 60 second buffer).
    ///
    /// A credential with no recorded expiry never expires and stays on the
    /// fast path until the server rejects it.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|exp| Utc::now() + Duration::seconds(EXPIRY_BUFFER_SECS) >= exp)
    }

    /// Returns true if the credential is valid (not expired).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.is_expired()
    }

    /// Returns true if this credential covers exactly the given scope set.
    #[must_use]
    pub fn authorized_for(&self, scopes: &ScopeSet) -> bool {
        self.scopes.matches(scopes)
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Sets the expiration time.
    #[must_use]
    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Returns the refresh token if available.
    ///
    /// # Errors
    ///
    /// Returns an error if no refresh token is available.
    pub fn refresh_token(&self) -> Result<&str> {
        self.refresh_token.as_deref().ok_or(Error::NoRefreshToken)
    }
}

/// Token response from the `OAuth2` token endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Token type.
    pub token_type: String,
    /// Expires in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u32>,
    /// Refresh token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Granted scope string (space-separated).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Error response from the `OAuth2` token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub error: String,
    /// Error description.
    #[serde(default)]
    pub error_description: String,
}

impl ErrorResponse {
    /// Converts to an [`Error`].
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::oauth_error(self.error, self.error_description)
    }
}
