//! # gmail-auth
//!
//! `OAuth2` credential lifecycle helper for the Gmail API.
//!
//! This crate obtains and maintains valid credentials for Gmail access and
//! exposes an authenticated client handle. It composes up to three sources:
//!
//! - **Persisted token artifact** — a JSON file reused across runs while the
//!   credential stays valid for the fixed scope set.
//! - **Refresh exchange** — an expired credential with a refresh token is
//!   renewed without user interaction; a refresh failure quietly falls
//!   through to re-authorization.
//! - **Interactive authorization** — the installed-app authorization code
//!   flow (with PKCE) over a single-shot loopback redirect listener.
//!
//! Client configuration comes from the `GOOGLE_CLIENT_ID` /
//! `GOOGLE_CLIENT_SECRET` environment pair, or from a `credentials.json`
//! file with an `installed` entry; the environment takes priority.
//!
//! ## Quick Start
//!
//! ```ignore
//! use gmail_auth::{AuthOptions, CredentialManager, GmailClient};
//!
//! #[tokio::main]
//! async fn main() -> gmail_auth::Result<()> {
//!     let manager = CredentialManager::from_options(AuthOptions::default());
//!
//!     // Loads token.json, refreshes, or opens the browser as needed.
//!     let credential = manager.obtain().await?;
//!
//!     let client = GmailClient::new(credential)?;
//!     let profile = client.profile().await?;
//!     println!("authenticated as {}", profile.email_address);
//!     Ok(())
//! }
//! ```
//!
//! ## Connectivity Probe
//!
//! ```ignore
//! use gmail_auth::{AuthOptions, Probe};
//!
//! let probe = Probe::from_options(AuthOptions::default())?;
//! let ok = probe.run().await; // true on a successful profile fetch
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod credential;
mod error;
pub mod flow;
pub mod gmail;
pub mod manager;
pub mod probe;
pub mod scope;
pub mod store;

pub use config::{ClientConfig, ConfigResolver};
pub use credential::Credential;
pub use error::{Error, Result};
pub use flow::{AuthorizationCodeFlow, OAuthClient, PkceChallenge, RedirectListener};
pub use gmail::{GmailClient, Profile};
pub use manager::{AuthOptions, CredentialManager, InstalledFlowBroker, TokenBroker};
pub use probe::Probe;
pub use scope::ScopeSet;
pub use store::TokenStore;
