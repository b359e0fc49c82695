//! Service discovery
//!
//! Resolves a logical service name to the instances currently registered for it:
//! - Consul agent API (`ConsulRegistry`)
//! - A fixed instance list (`StaticRegistry`)
//!
//! Instances are fetched fresh on every lookup and never cached.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

pub mod consul;
pub mod static_list;

pub use consul::ConsulRegistry;
pub use static_list::StaticRegistry;

use crate::{Error, Result};

/// One network-reachable endpoint of a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    /// Registry identifier the lookup matched on
    pub id: String,
    /// Host name or IP address
    pub address: String,
    /// Port
    pub port: u16,
}

impl ServiceInstance {
    /// Create an instance
    pub fn new(id: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            port,
        }
    }

    /// `scheme://address:port`
    #[must_use]
    pub fn base_url(&self, scheme: &str) -> String {
        if self.address.contains(':') && !self.address.starts_with('[') {
            // bare IPv6 literal
            format!("{scheme}://[{}]:{}", self.address, self.port)
        } else {
            format!("{scheme}://{}:{}", self.address, self.port)
        }
    }

    /// `scheme://address:port/path`
    ///
    /// # Errors
    ///
    /// Returns a transport error if the instance does not form a valid URL.
    pub fn endpoint(&self, scheme: &str, path: &str) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url(scheme), path.trim_start_matches('/'));
        Url::parse(&raw).map_err(|e| Error::Transport(format!("Invalid instance URL '{raw}': {e}")))
    }
}

impl fmt::Display for ServiceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.id, self.address, self.port)
    }
}

/// Registry lookup
#[async_trait]
pub trait Registry: Send + Sync {
    /// Instances registered under exactly `name`, in registry order
    ///
    /// An empty list means nothing is registered; registry failures are
    /// `Error::Registry`.
    async fn list_instances(&self, name: &str) -> Result<Vec<ServiceInstance>>;
}
