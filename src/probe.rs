//! End-to-end connectivity probe.

use crate::error::Result;
use crate::gmail::{GMAIL_API_BASE, GmailClient, Profile};
use crate::manager::{AuthOptions, CredentialManager, InstalledFlowBroker, TokenBroker};
use tracing::{error, info};
use url::Url;

/// Exercises the full chain — config resolution, credential lifecycle,
/// service adapter — and performs one read-only profile fetch.
///
/// This is the only place where every downstream error is recovered: the
/// outcome is a boolean.
#[derive(Debug)]
pub struct Probe<B = InstalledFlowBroker> {
    manager: CredentialManager<B>,
    api_base: Url,
}

impl Probe<InstalledFlowBroker> {
    /// Builds the production probe from lifecycle options.
    ///
    /// # Errors
    ///
    /// Returns an error if the Gmail API base URL constant fails to parse.
    pub fn from_options(options: AuthOptions) -> Result<Self> {
        Ok(Self::new(
            CredentialManager::from_options(options),
            Url::parse(GMAIL_API_BASE)?,
        ))
    }
}

impl<B: TokenBroker> Probe<B> {
    /// Creates a probe over an explicit manager and API base URL.
    #[must_use]
    pub const fn new(manager: CredentialManager<B>, api_base: Url) -> Self {
        Self { manager, api_base }
    }

    /// Runs the connectivity check.
    ///
    /// Any failure anywhere in the chain is reported and converted to
    /// `false`; nothing propagates past this point.
    pub async fn run(&self) -> bool {
        match self.check().await {
            Ok(profile) => {
                info!(
                    email = %profile.email_address,
                    messages = profile.messages_total,
                    "successfully connected to Gmail"
                );
                true
            }
            Err(e) => {
                error!("connectivity check failed: {e}");
                false
            }
        }
    }

    async fn check(&self) -> Result<Profile> {
        let credential = self.manager.obtain().await?;
        let client = GmailClient::with_base_url(credential, self.api_base.clone())?;
        client.profile().await
    }
}
