//! Consul agent registry

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};
use url::Url;

use super::{Registry, ServiceInstance};
use crate::config::DiscoveryConfig;
use crate::{Error, Result};

/// ACL token header
const TOKEN_HEADER: &str = "X-Consul-Token";

/// Service entry from `/v1/agent/services`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AgentService {
    #[serde(rename = "ID")]
    id: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    port: u16,
}

/// Registry backed by a Consul agent
pub struct ConsulRegistry {
    client: Client,
    base_url: Url,
    token: String,
}

impl ConsulRegistry {
    /// Build a registry client
    ///
    /// `config.address` may carry its own `http://` or `https://` prefix,
    /// otherwise `config.scheme` is used.
    pub fn new(config: &DiscoveryConfig) -> Result<Self> {
        let (scheme, host) = match config.address.split_once("://") {
            Some((scheme, host)) => (scheme, host),
            None => (config.scheme.as_str(), config.address.as_str()),
        };

        if !matches!(scheme, "http" | "https") {
            return Err(Error::Registry(format!(
                "Unsupported registry scheme '{scheme}'"
            )));
        }
        if host.is_empty() {
            return Err(Error::Registry("Registry address is empty".to_string()));
        }

        let base_url = Url::parse(&format!("{scheme}://{}/", host.trim_end_matches('/')))
            .map_err(|e| Error::Registry(format!("Invalid registry address '{host}': {e}")))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Registry(format!("Failed to build registry client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
        })
    }

    /// Agent API base URL
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn agent_services(&self) -> Result<BTreeMap<String, AgentService>> {
        let url = self
            .base_url
            .join("v1/agent/services")
            .map_err(|e| Error::Registry(e.to_string()))?;

        let mut request = self.client.get(url.clone());
        if !self.token.is_empty() {
            request = request.header(TOKEN_HEADER, &self.token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Registry(format!("Failed to query {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Registry(format!(
                "Registry returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Registry(format!("Failed to parse registry response: {e}")))
    }
}

#[async_trait]
impl Registry for ConsulRegistry {
    async fn list_instances(&self, name: &str) -> Result<Vec<ServiceInstance>> {
        let services = self.agent_services().await.inspect_err(|e| {
            error!(service = name, error = %e, "Failed to list services from registry");
        })?;

        let instances: Vec<ServiceInstance> = services
            .into_values()
            .filter(|s| s.id == name)
            .map(|s| ServiceInstance::new(s.id, s.address, s.port))
            .collect();

        debug!(service = name, count = instances.len(), "Resolved instances");
        Ok(instances)
    }
}
