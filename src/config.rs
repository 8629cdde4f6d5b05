//! `OAuth2` client configuration and its two-stage resolver.
//!
//! A [`ClientConfig`] identifies this application to the authorization
//! server. It comes from exactly one of two sources, tried in order:
//!
//! 1. The `GOOGLE_CLIENT_ID`/`GOOGLE_CLIENT_SECRET` environment pair,
//!    combined with the standard Google endpoint constants.
//! 2. A `credentials.json` file with an `installed` application entry, as
//!    downloaded from the Google Cloud console.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable supplying the client ID.
pub const CLIENT_ID_VAR: &str = "GOOGLE_CLIENT_ID";

/// Environment variable supplying the client secret.
pub const CLIENT_SECRET_VAR: &str = "GOOGLE_CLIENT_SECRET";

/// Google's authorization endpoint.
pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google's token endpoint.
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Redirect target registered for the environment-supplied configuration.
const DEFAULT_REDIRECT_URI: &str = "http://localhost";

/// Identifies the calling application to the authorization server.
///
/// Immutable once loaded; never persisted by this crate.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `OAuth2` client identifier.
    pub client_id: String,
    /// `OAuth2` client secret.
    pub client_secret: String,
    /// Authorization endpoint.
    pub auth_uri: Url,
    /// Token endpoint.
    pub token_uri: Url,
    /// Registered redirect targets.
    pub redirect_uris: Vec<String>,
}

impl ClientConfig {
    /// Builds a config from a client ID/secret pair using the standard
    /// Google endpoints and a local redirect target.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint constants fail to parse (which would
    /// indicate a build defect, not a runtime condition).
    pub fn from_pair(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_uri: Url::parse(GOOGLE_AUTH_URI)?,
            token_uri: Url::parse(GOOGLE_TOKEN_URI)?,
            redirect_uris: vec![DEFAULT_REDIRECT_URI.to_string()],
        })
    }
}

/// On-disk credentials file with the `installed` application entry.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: InstalledApp,
}

#[derive(Debug, Deserialize)]
struct InstalledApp {
    client_id: String,
    client_secret: String,
    auth_uri: String,
    token_uri: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

impl TryFrom<CredentialsFile> for ClientConfig {
    type Error = Error;

    fn try_from(file: CredentialsFile) -> Result<Self> {
        Ok(Self {
            client_id: file.installed.client_id,
            client_secret: file.installed.client_secret,
            auth_uri: Url::parse(&file.installed.auth_uri)?,
            token_uri: Url::parse(&file.installed.token_uri)?,
            redirect_uris: file.installed.redirect_uris,
        })
    }
}

/// Ordered two-stage resolver: environment pair first, credentials file
/// second.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    credentials_path: PathBuf,
}

impl ConfigResolver {
    /// Creates a resolver reading the credentials file from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: path.into(),
        }
    }

    /// Path of the credentials file this resolver reads.
    #[must_use]
    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    /// Resolves a client configuration from the process environment or the
    /// credentials file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigMissing`] when neither source is present, or a
    /// parse error when the credentials file is malformed.
    pub fn resolve(&self) -> Result<ClientConfig> {
        // A partial pair (only one variable set) counts as not present.
        let env_pair = env::var(CLIENT_ID_VAR)
            .ok()
            .zip(env::var(CLIENT_SECRET_VAR).ok());
        self.resolve_from(env_pair)
    }

    /// Deterministic resolution from an explicit environment pair.
    ///
    /// [`ConfigResolver::resolve`] delegates here after reading the process
    /// environment; callers that already hold the values (or tests) can call
    /// this directly.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigMissing`] when the pair is absent and no
    /// credentials file exists.
    pub fn resolve_from(&self, env_pair: Option<(String, String)>) -> Result<ClientConfig> {
        if let Some((client_id, client_secret)) = env_pair {
            tracing::debug!("resolved OAuth client config from environment");
            return ClientConfig::from_pair(client_id, client_secret);
        }

        if let Some(config) = self.file_config()? {
            tracing::debug!(
                path = %self.credentials_path.display(),
                "resolved OAuth client config from credentials file"
            );
            return Ok(config);
        }

        Err(Error::ConfigMissing {
            credentials_path: self.credentials_path.clone(),
        })
    }

    /// Reads the credentials file stage. `Ok(None)` means the file does not
    /// exist; a file that exists but fails to parse is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn file_config(&self) -> Result<Option<ClientConfig>> {
        if !self.credentials_path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.credentials_path)?;
        let file: CredentialsFile = serde_json::from_str(&contents)?;
        Ok(Some(ClientConfig::try_from(file)?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_credentials_file(contents: &str) -> PathBuf {
        let path = env::temp_dir().join(format!(
            "gmail-auth-config-test-{}-{:08x}",
            std::process::id(),
            rand::random::<u32>()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    const CREDENTIALS_JSON: &str = r#"{
        "installed": {
            "client_id": "file-client-id",
            "client_secret": "file-client-secret",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token",
            "redirect_uris": ["http://localhost"]
        }
    }"#;

    #[test]
    fn test_env_pair_takes_priority_over_file() {
        let path = temp_credentials_file(CREDENTIALS_JSON);
        let resolver = ConfigResolver::new(&path);

        let config = resolver
            .resolve_from(Some(("env-id".to_string(), "env-secret".to_string())))
            .unwrap();

        assert_eq!(config.client_id, "env-id");
        assert_eq!(config.client_secret, "env-secret");
        assert_eq!(config.auth_uri.as_str(), GOOGLE_AUTH_URI);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_falls_back_to_credentials_file() {
        let path = temp_credentials_file(CREDENTIALS_JSON);
        let resolver = ConfigResolver::new(&path);

        let config = resolver.resolve_from(None).unwrap();
        assert_eq!(config.client_id, "file-client-id");
        assert_eq!(config.redirect_uris, vec!["http://localhost".to_string()]);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_everything_is_terminal() {
        let resolver = ConfigResolver::new("/nonexistent/credentials.json");
        let err = resolver.resolve_from(None).unwrap_err();
        assert!(matches!(err, Error::ConfigMissing { .. }));
        // The message must name both remediation paths.
        let message = err.to_string();
        assert!(message.contains(CLIENT_ID_VAR));
        assert!(message.contains("/nonexistent/credentials.json"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let path = temp_credentials_file("{ not json");
        let resolver = ConfigResolver::new(&path);
        assert!(matches!(resolver.resolve_from(None), Err(Error::Json(_))));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_absent_file_stage_returns_none() {
        let resolver = ConfigResolver::new("/nonexistent/credentials.json");
        assert!(resolver.file_config().unwrap().is_none());
    }
}
