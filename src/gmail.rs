//! Authenticated Gmail API client handle.

use crate::credential::Credential;
use crate::error::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

/// Base URL of the Gmail REST API.
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/";

/// The authenticated user's mailbox profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// The user's email address.
    pub email_address: String,
    /// Total number of messages in the mailbox.
    #[serde(default)]
    pub messages_total: u64,
    /// Total number of threads in the mailbox.
    #[serde(default)]
    pub threads_total: u64,
    /// The mailbox's current history ID.
    #[serde(default)]
    pub history_id: String,
}

/// Gmail API error envelope.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Thin authenticated handle over the Gmail API.
///
/// Pure composition: holds the credential and an HTTP client, no further
/// state. Construction fails only on a structurally invalid credential.
#[derive(Debug, Clone)]
pub struct GmailClient {
    http: Client,
    base_url: Url,
    credential: Credential,
}

impl GmailClient {
    /// Creates a client against the production Gmail API.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredential`] if the credential has an empty
    /// access token.
    pub fn new(credential: Credential) -> Result<Self> {
        Self::with_base_url(credential, Url::parse(GMAIL_API_BASE)?)
    }

    /// Creates a client against an explicit API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredential`] if the credential has an empty
    /// access token.
    pub fn with_base_url(credential: Credential, base_url: Url) -> Result<Self> {
        if credential.access_token.is_empty() {
            return Err(Error::InvalidCredential(
                "access token is empty".to_string(),
            ));
        }
        Ok(Self {
            http: Client::new(),
            base_url,
            credential,
        })
    }

    /// The credential backing this handle.
    #[must_use]
    pub const fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Fetches the authenticated user's mailbox profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    pub async fn profile(&self) -> Result<Profile> {
        let url = self.base_url.join("users/me/profile")?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.credential.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorEnvelope>()
                .await
                .map_or_else(|_| status.to_string(), |envelope| envelope.error.message);
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(Into::into)
    }
}
