//! Standalone Gmail connectivity probe.
//!
//! Resolves client configuration, obtains a credential (refreshing or
//! running the authorization flow as needed), fetches the account profile,
//! and exits with a success/failure code.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use gmail_auth::{AuthOptions, Probe};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gmail_auth=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("testing Gmail API authentication");

    let probe = match Probe::from_options(AuthOptions::default()) {
        Ok(probe) => probe,
        Err(e) => {
            error!("failed to construct probe: {e}");
            return ExitCode::FAILURE;
        }
    };

    if probe.run().await {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
