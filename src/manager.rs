//! Credential lifecycle management.
//!
//! [`CredentialManager`] composes three sources into a valid credential:
//! the persisted token artifact, the refresh exchange, and the interactive
//! authorization flow. The transitions are:
//!
//! - persisted credential valid for the fixed scope set → returned as-is
//!   (no write, no network),
//! - expired with a refresh token → refresh exchange, persist on success,
//! - refresh failure, absent artifact, or scope mismatch → interactive
//!   authorization, persist on success.
//!
//! Refresh failure is the single recovered error: it is logged and the
//! manager falls through to authorization. Everything else propagates.

use crate::config::ConfigResolver;
use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::flow::{AuthorizationCodeFlow, OAuthClient, RedirectListener};
use crate::scope::ScopeSet;
use crate::store::TokenStore;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Default path of the persisted token artifact.
pub const DEFAULT_TOKEN_PATH: &str = "token.json";

/// Default path of the client credentials file.
pub const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";

/// Construction-time configuration for the credential lifecycle.
///
/// All well-known values (paths, scope set) are carried here explicitly so
/// callers and tests can substitute isolated storage.
#[derive(Debug, Clone)]
pub struct AuthOptions {
    /// Path of the persisted token artifact.
    pub token_path: PathBuf,
    /// Path of the client credentials file.
    pub credentials_path: PathBuf,
    /// Fixed scope set every credential must be authorized for.
    pub scopes: ScopeSet,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            scopes: ScopeSet::gmail(),
        }
    }
}

impl AuthOptions {
    /// Sets the token artifact path.
    #[must_use]
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Sets the credentials file path.
    #[must_use]
    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }

    /// Sets the scope set.
    #[must_use]
    pub fn with_scopes(mut self, scopes: ScopeSet) -> Self {
        self.scopes = scopes;
        self
    }
}

/// Seam between the lifecycle state machine and the network-facing flows.
///
/// The production implementation is [`InstalledFlowBroker`]; tests inject
/// simulated brokers to exercise the transitions without network access.
#[async_trait]
pub trait TokenBroker: Send + Sync {
    /// Performs the refresh exchange for an expired credential.
    async fn refresh(&self, credential: &Credential) -> Result<Credential>;

    /// Drives the interactive authorization flow for the given scopes.
    ///
    /// Blocks until the user completes (or denies) consent in the browser.
    async fn authorize(&self, scopes: &ScopeSet) -> Result<Credential>;
}

/// Production [`TokenBroker`] backed by the installed-app authorization
/// code flow with a loopback redirect listener.
#[derive(Debug, Clone)]
pub struct InstalledFlowBroker {
    resolver: ConfigResolver,
}

impl InstalledFlowBroker {
    /// Creates a broker resolving client configuration through `resolver`.
    #[must_use]
    pub const fn new(resolver: ConfigResolver) -> Self {
        Self { resolver }
    }
}

/// Random `state` parameter for CSRF protection of the redirect.
fn random_state() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[async_trait]
impl TokenBroker for InstalledFlowBroker {
    async fn refresh(&self, credential: &Credential) -> Result<Credential> {
        let config = self.resolver.resolve()?;
        let client = OAuthClient::from_config(&config);
        client.refresh(credential).await
    }

    async fn authorize(&self, scopes: &ScopeSet) -> Result<Credential> {
        let config = self.resolver.resolve()?;

        let listener = RedirectListener::bind().await?;
        let client =
            OAuthClient::from_config(&config).with_redirect_uri(listener.redirect_uri());
        let flow = AuthorizationCodeFlow::new(client).with_pkce();

        let state = random_state();
        let auth_url = flow.authorization_url(scopes, Some(&state))?;

        info!("waiting for authorization in the browser");
        if let Err(e) = opener::open(auth_url.as_str()) {
            warn!("could not launch a browser ({e}); open this URL manually:\n{auth_url}");
        }

        let callback = listener.recv().await?;
        if callback.state.as_deref() != Some(state.as_str()) {
            return Err(Error::InvalidCallback(
                "state parameter mismatch".to_string(),
            ));
        }

        let credential = flow.exchange_code(&callback.code, scopes).await?;
        info!("authorization flow completed");
        Ok(credential)
    }
}

/// What the persisted artifact gave us, typed per transition.
#[derive(Debug)]
enum Loaded {
    /// No artifact at the storage path.
    Absent,
    /// Unexpired and authorized for the fixed scope set.
    Valid(Credential),
    /// Expired but carrying a refresh token, scopes matching.
    Refreshable(Credential),
    /// Present but unusable: wrong scopes, or expired with no refresh token.
    Unusable,
}

/// Produces valid credentials by loading, refreshing, or re-authorizing,
/// and persists every credential obtained over the network.
#[derive(Debug)]
pub struct CredentialManager<B = InstalledFlowBroker> {
    store: TokenStore,
    scopes: ScopeSet,
    broker: B,
}

impl CredentialManager<InstalledFlowBroker> {
    /// Creates a production manager from lifecycle options.
    #[must_use]
    pub fn from_options(options: AuthOptions) -> Self {
        let broker = InstalledFlowBroker::new(ConfigResolver::new(options.credentials_path));
        Self::new(TokenStore::new(options.token_path), options.scopes, broker)
    }
}

impl<B: TokenBroker> CredentialManager<B> {
    /// Creates a manager over an explicit store, scope set, and broker.
    #[must_use]
    pub const fn new(store: TokenStore, scopes: ScopeSet, broker: B) -> Self {
        Self {
            store,
            scopes,
            broker,
        }
    }

    /// The token store this manager persists to.
    #[must_use]
    pub const fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Obtains a credential valid for the fixed scope set.
    ///
    /// # Errors
    ///
    /// Returns a configuration or authorization error when no usable
    /// credential can be produced. Refresh failures are recovered by
    /// falling through to the authorization flow and do not surface here.
    pub async fn obtain(&self) -> Result<Credential> {
        match self.classify(self.store.load()?) {
            Loaded::Valid(credential) => {
                debug!("using persisted credential");
                Ok(credential)
            }
            Loaded::Refreshable(credential) => match self.broker.refresh(&credential).await {
                Ok(refreshed) => {
                    self.store.save(&refreshed)?;
                    info!("credential refreshed");
                    Ok(refreshed)
                }
                Err(e) => {
                    warn!("refresh failed ({e}); starting authorization flow");
                    self.authorize_and_persist().await
                }
            },
            Loaded::Absent | Loaded::Unusable => self.authorize_and_persist().await,
        }
    }

    fn classify(&self, loaded: Option<Credential>) -> Loaded {
        let Some(credential) = loaded else {
            return Loaded::Absent;
        };

        if !credential.authorized_for(&self.scopes) {
            // A refresh only renews the original grant, so a different scope
            // set can never become usable without new consent.
            warn!(
                persisted = %credential.scopes,
                required = %self.scopes,
                "persisted credential covers a different scope set"
            );
            return Loaded::Unusable;
        }

        if credential.is_valid() {
            Loaded::Valid(credential)
        } else if credential.refresh_token.is_some() {
            Loaded::Refreshable(credential)
        } else {
            debug!("persisted credential expired with no refresh token");
            Loaded::Unusable
        }
    }

    async fn authorize_and_persist(&self) -> Result<Credential> {
        let credential = self.broker.authorize(&self.scopes).await?;
        self.store.save(&credential)?;
        info!("new credential authorized and persisted");
        Ok(credential)
    }
}
