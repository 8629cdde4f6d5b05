//! Authorization Code Flow for the installed-app profile.

use super::{OAuthClient, PkceChallenge};
use crate::credential::Credential;
use crate::error::Result;
use crate::scope::ScopeSet;
use url::Url;

/// Authorization Code Flow bound to a fixed scope set.
///
/// Builds the consent URL for the user's browser and exchanges the returned
/// code for a credential. Google's installed-app parameters
/// (`access_type=offline`, `prompt=consent`) are always sent so the grant
/// includes a refresh token.
#[derive(Debug)]
pub struct AuthorizationCodeFlow {
    client: OAuthClient,
    pkce: Option<PkceChallenge>,
}

impl AuthorizationCodeFlow {
    /// Creates a new authorization code flow.
    #[must_use]
    pub const fn new(client: OAuthClient) -> Self {
        Self { client, pkce: None }
    }

    /// Enables PKCE (recommended; installed apps are public clients).
    #[must_use]
    pub fn with_pkce(mut self) -> Self {
        self.pkce = Some(PkceChallenge::generate());
        self
    }

    /// Builds the authorization URL the user should visit to grant consent.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be constructed.
    pub fn authorization_url(&self, scopes: &ScopeSet, state: Option<&str>) -> Result<Url> {
        let mut url = self.client.auth_uri().clone();

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("client_id", &self.client.client_id)
                .append_pair("response_type", "code");

            if let Some(redirect_uri) = &self.client.redirect_uri {
                pairs.append_pair("redirect_uri", redirect_uri);
            }

            if !scopes.is_empty() {
                pairs.append_pair("scope", &scopes.join());
            }

            if let Some(state_val) = state {
                pairs.append_pair("state", state_val);
            }

            if let Some(pkce) = &self.pkce {
                pairs
                    .append_pair("code_challenge", pkce.challenge())
                    .append_pair("code_challenge_method", PkceChallenge::method());
            }

            // Required for Google to issue a refresh token to installed apps.
            pairs
                .append_pair("access_type", "offline")
                .append_pair("prompt", "consent");
        }

        Ok(url)
    }

    /// Exchanges the authorization code for a credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange fails.
    pub async fn exchange_code(&self, code: &str, scopes: &ScopeSet) -> Result<Credential> {
        let code_verifier = self.pkce.as_ref().map(PkceChallenge::verifier);
        self.client.exchange_code(code, code_verifier, scopes).await
    }
}
