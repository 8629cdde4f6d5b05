//! `OAuth2` authorization flow plumbing.

mod code;
mod pkce;
mod redirect;

pub use code::AuthorizationCodeFlow;
pub use pkce::PkceChallenge;
pub use redirect::{Callback, RedirectListener};

use crate::config::ClientConfig;
use crate::credential::{Credential, ErrorResponse, TokenResponse};
use crate::error::Result;
use crate::scope::ScopeSet;
use reqwest::Client;
use std::collections::HashMap;
use url::Url;

/// HTTP client for the token endpoint exchanges.
///
/// Wraps the resolved [`ClientConfig`] and performs the two network
/// operations this crate needs: the refresh exchange and the
/// authorization-code exchange.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    /// Client ID from the resolved configuration.
    pub client_id: String,
    /// Client secret (optional for public clients).
    pub client_secret: Option<String>,
    /// Redirect URI for the authorization code flow.
    pub redirect_uri: Option<String>,
    auth_uri: Url,
    token_uri: Url,
    http_client: Client,
}

impl OAuthClient {
    /// Creates a client against explicit endpoints.
    #[must_use]
    pub fn new(client_id: impl Into<String>, auth_uri: Url, token_uri: Url) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: None,
            auth_uri,
            token_uri,
            http_client: Client::new(),
        }
    }

    /// Creates a client from a resolved configuration.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.client_id.clone(),
            config.auth_uri.clone(),
            config.token_uri.clone(),
        )
        .with_client_secret(config.client_secret.clone())
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Authorization endpoint this client talks to.
    #[must_use]
    pub const fn auth_uri(&self) -> &Url {
        &self.auth_uri
    }

    /// Refreshes an access token using the credential's refresh token.
    ///
    /// The refreshed credential keeps the old refresh token and scopes when
    /// the server omits them from the response, which Google routinely does.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential has no refresh token, the exchange
    /// fails on the wire, or the server rejects the grant.
    pub async fn refresh(&self, credential: &Credential) -> Result<Credential> {
        let refresh_token = credential.refresh_token()?;

        let mut params = HashMap::new();
        params.insert("grant_type", "refresh_token");
        params.insert("refresh_token", refresh_token);
        params.insert("client_id", &self.client_id);
        if let Some(secret) = &self.client_secret {
            params.insert("client_secret", secret);
        }

        let response = self.post_token_endpoint(&params).await?;
        let mut refreshed = Credential::from_response(response, &credential.scopes);
        if refreshed.refresh_token.is_none() {
            refreshed.refresh_token.clone_from(&credential.refresh_token);
        }
        Ok(refreshed)
    }

    /// Exchanges an authorization code for a credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub(crate) async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
        requested: &ScopeSet,
    ) -> Result<Credential> {
        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("client_id", &self.client_id);

        if let Some(uri) = self.redirect_uri.as_deref() {
            params.insert("redirect_uri", uri);
        }
        if let Some(secret) = &self.client_secret {
            params.insert("client_secret", secret);
        }
        if let Some(verifier) = code_verifier {
            params.insert("code_verifier", verifier);
        }

        let response = self.post_token_endpoint(&params).await?;
        Ok(Credential::from_response(response, requested))
    }

    async fn post_token_endpoint(&self, params: &HashMap<&str, &str>) -> Result<TokenResponse> {
        let response = self
            .http_client
            .post(self.token_uri.clone())
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let error: ErrorResponse = response.json().await?;
            return Err(error.into_error());
        }

        response.json().await.map_err(Into::into)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn google_endpoints() -> (Url, Url) {
        (
            Url::parse(crate::config::GOOGLE_AUTH_URI).unwrap(),
            Url::parse(crate::config::GOOGLE_TOKEN_URI).unwrap(),
        )
    }

    #[test]
    fn test_client_from_config() {
        let config = ClientConfig::from_pair("test-id", "test-secret").unwrap();
        let client = OAuthClient::from_config(&config);
        assert_eq!(client.client_id, "test-id");
        assert_eq!(client.client_secret.as_deref(), Some("test-secret"));
        assert!(client.redirect_uri.is_none());
    }

    #[test]
    fn test_client_builders() {
        let (auth_uri, token_uri) = google_endpoints();
        let client = OAuthClient::new("test-id", auth_uri, token_uri)
            .with_client_secret("secret")
            .with_redirect_uri("http://127.0.0.1:9999");
        assert_eq!(client.redirect_uri.as_deref(), Some("http://127.0.0.1:9999"));
    }

    #[tokio::test]
    async fn test_refresh_preserves_refresh_token_and_scopes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                mockito::Matcher::UrlEncoded("refresh_token".into(), "refresh456".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token":"new-access","token_type":"Bearer","expires_in":3600}"#,
            )
            .create_async()
            .await;

        let (auth_uri, _) = google_endpoints();
        let token_uri = Url::parse(&format!("{}/token", server.url())).unwrap();
        let client = OAuthClient::new("test-id", auth_uri, token_uri).with_client_secret("secret");

        let old = Credential::new("old-access", ScopeSet::gmail()).with_refresh_token("refresh456");
        let refreshed = client.refresh(&old).await.unwrap();

        mock.assert_async().await;
        assert_eq!(refreshed.access_token, "new-access");
        assert_eq!(refreshed.refresh_token.as_deref(), Some("refresh456"));
        assert!(refreshed.authorized_for(&ScopeSet::gmail()));
        assert!(refreshed.is_valid());
    }

    #[tokio::test]
    async fn test_refresh_surfaces_invalid_grant() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"invalid_grant","error_description":"Token revoked"}"#)
            .create_async()
            .await;

        let (auth_uri, _) = google_endpoints();
        let token_uri = Url::parse(&format!("{}/token", server.url())).unwrap();
        let client = OAuthClient::new("test-id", auth_uri, token_uri);

        let old = Credential::new("old-access", ScopeSet::gmail()).with_refresh_token("revoked");
        let err = client.refresh(&old).await.unwrap_err();
        assert!(matches!(err, Error::OAuth { ref error, .. } if error == "invalid_grant"));
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_fails_locally() {
        let (auth_uri, token_uri) = google_endpoints();
        let client = OAuthClient::new("test-id", auth_uri, token_uri);
        let bare = Credential::new("access", ScopeSet::gmail());
        assert!(matches!(
            client.refresh(&bare).await,
            Err(Error::NoRefreshToken)
        ));
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
                mockito::Matcher::UrlEncoded("code".into(), "auth-code-1".into()),
                mockito::Matcher::UrlEncoded("redirect_uri".into(), "http://127.0.0.1:4".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token":"fresh","token_type":"Bearer","expires_in":3599,"refresh_token":"r1"}"#,
            )
            .create_async()
            .await;

        let (auth_uri, _) = google_endpoints();
        let token_uri = Url::parse(&format!("{}/token", server.url())).unwrap();
        let client = OAuthClient::new("test-id", auth_uri, token_uri)
            .with_redirect_uri("http://127.0.0.1:4");

        let credential = client
            .exchange_code("auth-code-1", Some("verifier"), &ScopeSet::gmail())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(credential.access_token, "fresh");
        assert_eq!(credential.refresh_token.as_deref(), Some("r1"));
    }
}
