//! Cuttle Service SDK
//!
//! Locates sibling platform services through a discovery registry and calls
//! them over HTTP.
//!
//! # Features
//!
//! - **Discovery**: instances resolved per call from the Consul agent API
//! - **Failover**: instances tried in registry order, first success wins
//! - **Retry**: bounded exponential backoff with jitter per instance call
//! - **Auth**: access token as a header, bearer token or domain-scoped cookie
//! - **Envelopes**: typed `{Message, Data}` responses
//!
//! ```no_run
//! # async fn run() -> cuttle_sdk::Result<()> {
//! use cuttle_sdk::{SdkClient, config::Config};
//!
//! let config = Config::load(None)?;
//! let client = SdkClient::from_config(&config)?;
//! for datastore in client.list_datastores().await? {
//!     println!("{} {}", datastore.id, datastore.name);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod discovery;
pub mod envelope;
pub mod error;
pub mod invoker;
pub mod retry;
pub mod services;
pub mod transport;

pub use client::SdkClient;
pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// # Errors
///
/// Returns a config error if a global subscriber is already installed.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = match format {
        Some("json") => subscriber.with(fmt::layer().json()).try_init(),
        _ => subscriber.with(fmt::layer()).try_init(),
    };

    installed.map_err(|e| Error::Config(format!("Failed to install tracing subscriber: {e}")))
}
