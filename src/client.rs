//! SDK client: configuration wired into registry, transport and invoker

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::Result;
use crate::config::Config;
use crate::discovery::{ConsulRegistry, ServiceInstance};
use crate::invoker::{BroadcastReport, FailoverInvoker};
use crate::services::{Datastore, Notification, datastores, octopus, websockets};
use crate::transport::HttpTransport;

/// Entry point for calling platform services
#[derive(Debug, Clone)]
pub struct SdkClient {
    invoker: FailoverInvoker,
}

impl SdkClient {
    /// Build from configuration: Consul registry plus HTTP transport
    ///
    /// # Errors
    ///
    /// `Error::Registry` for an unusable registry address, `Error::Transport`
    /// if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = ConsulRegistry::new(&config.discovery)?;
        let transport = HttpTransport::new(&config.retry, config.auth.auth_mode())?;
        debug!(
            registry = %registry.base_url(),
            auth_mode = ?transport.auth_mode(),
            "SDK client configured"
        );

        let invoker = FailoverInvoker::new(
            Arc::new(registry),
            Arc::new(transport),
            config.auth.credentials(),
        )
        .with_scheme(&config.services.scheme);

        Ok(Self::new(invoker))
    }

    /// Wrap an existing invoker
    #[must_use]
    pub fn new(invoker: FailoverInvoker) -> Self {
        Self { invoker }
    }

    /// Underlying invoker
    #[must_use]
    pub fn invoker(&self) -> &FailoverInvoker {
        &self.invoker
    }

    /// Instances currently registered under `service`
    pub async fn instances(&self, service: &str) -> Result<Vec<ServiceInstance>> {
        self.invoker.registry().list_instances(service).await
    }

    /// See [`datastores::list_datastores`]
    pub async fn list_datastores(&self) -> Result<Vec<Datastore>> {
        datastores::list_datastores(&self.invoker).await
    }

    /// See [`datastores::get_datastore`]
    pub async fn get_datastore(&self, id: u64) -> Result<Option<Datastore>> {
        datastores::get_datastore(&self.invoker, id).await
    }

    /// See [`datastores::create_datastore`]
    pub async fn create_datastore(&self, datastore: &Datastore) -> Result<Option<Datastore>> {
        datastores::create_datastore(&self.invoker, datastore).await
    }

    /// See [`octopus::remove_dict`]
    pub async fn remove_dict(&self) -> Result<BroadcastReport<Value>> {
        octopus::remove_dict(&self.invoker).await
    }

    /// See [`octopus::update_dict`]
    pub async fn update_dict(&self) -> Result<BroadcastReport<Value>> {
        octopus::update_dict(&self.invoker).await
    }

    /// See [`websockets::send_notification`]
    pub async fn send_notification(&self, notification: &Notification) -> Result<()> {
        websockets::send_notification(&self.invoker, notification).await
    }

    /// See [`websockets::send_info_notification`]
    pub async fn send_info_notification(&self, notification: Notification) -> Result<()> {
        websockets::send_info_notification(&self.invoker, notification).await
    }
}
