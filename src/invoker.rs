//! Failover invoker
//!
//! Resolves a service through the registry, then walks its instances in
//! registry order, one transport call per instance, stopping at the first
//! instance that answers with a decodable envelope. Instances are tried
//! strictly one after another; there is no racing and no outer deadline.
//!
//! `broadcast` is the variant for per-instance state (cache dictionaries):
//! it contacts every instance and never stops early.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

use crate::auth::Credentials;
use crate::discovery::{Registry, ServiceInstance};
use crate::envelope::{self, Envelope};
use crate::transport::Transport;
use crate::{Error, Result};

/// A remote operation: service, path and method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call<'a> {
    /// Registry name of the service
    pub service: &'a str,
    /// Path on the instance
    pub path: &'a str,
    /// HTTP method
    pub method: Method,
}

impl<'a> Call<'a> {
    /// GET call
    #[must_use]
    pub const fn get(service: &'a str, path: &'a str) -> Self {
        Self {
            service,
            path,
            method: Method::GET,
        }
    }

    /// POST call
    #[must_use]
    pub const fn post(service: &'a str, path: &'a str) -> Self {
        Self {
            service,
            path,
            method: Method::POST,
        }
    }
}

/// Where an instance attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Network, timeout, retry budget or non-2xx status
    Transport,
    /// Response body could not be read
    Read,
    /// Body was not a well-formed envelope
    Decode,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Read => write!(f, "read"),
            Self::Decode => write!(f, "decode"),
        }
    }
}

/// One failed instance attempt
#[derive(Debug, Clone)]
pub struct InstanceFailure {
    /// Instance that failed
    pub instance: ServiceInstance,
    /// Stage of the failure
    pub stage: FailureStage,
    /// Error message
    pub error: String,
}

impl InstanceFailure {
    fn new(instance: &ServiceInstance, stage: FailureStage, error: &Error) -> Self {
        Self {
            instance: instance.clone(),
            stage,
            error: error.to_string(),
        }
    }
}

/// Result of one invocation
#[derive(Debug)]
pub enum Outcome<T> {
    /// An instance answered with a decodable envelope
    Succeeded {
        /// Instance that answered
        instance: ServiceInstance,
        /// Decoded envelope
        envelope: Envelope<T>,
    },
    /// The registry had nothing under the service name
    NoInstancesRegistered {
        /// Service name
        service: String,
    },
    /// Every instance failed
    AllInstancesFailed {
        /// Service name
        service: String,
        /// One entry per instance, in attempt order
        failures: Vec<InstanceFailure>,
    },
}

impl<T> Outcome<T> {
    /// Whether an instance answered
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Convert to a result, turning both failure outcomes into errors
    ///
    /// # Errors
    ///
    /// `Error::NoInstances` or `Error::AllInstancesFailed`.
    pub fn into_result(self) -> Result<Envelope<T>> {
        match self {
            Self::Succeeded { envelope, .. } => Ok(envelope),
            Self::NoInstancesRegistered { service } => Err(Error::NoInstances(service)),
            Self::AllInstancesFailed { service, failures } => Err(Error::AllInstancesFailed {
                service,
                attempts: failures.len(),
            }),
        }
    }
}

/// Result of a broadcast
#[derive(Debug)]
pub struct BroadcastReport<T> {
    /// Service name
    pub service: String,
    /// Instances that answered, with their envelopes
    pub delivered: Vec<(ServiceInstance, Envelope<T>)>,
    /// Instances that failed
    pub failures: Vec<InstanceFailure>,
}

impl<T> BroadcastReport<T> {
    /// Number of instances contacted
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failures.len()
    }

    /// Succeeds if at least one instance answered
    ///
    /// # Errors
    ///
    /// `Error::NoInstances` when nothing was registered,
    /// `Error::AllInstancesFailed` when nothing answered.
    pub fn into_result(self) -> Result<Self> {
        if !self.delivered.is_empty() {
            return Ok(self);
        }
        if self.failures.is_empty() {
            Err(Error::NoInstances(self.service))
        } else {
            Err(Error::AllInstancesFailed {
                attempts: self.failures.len(),
                service: self.service,
            })
        }
    }
}

/// Discovery-backed failover invoker
#[derive(Clone)]
pub struct FailoverInvoker {
    registry: Arc<dyn Registry>,
    transport: Arc<dyn Transport>,
    credentials: Credentials,
    scheme: String,
}

impl FailoverInvoker {
    /// Create an invoker calling instances over `http`
    pub fn new(
        registry: Arc<dyn Registry>,
        transport: Arc<dyn Transport>,
        credentials: Credentials,
    ) -> Self {
        Self {
            registry,
            transport,
            credentials,
            scheme: "http".to_string(),
        }
    }

    /// Use another scheme for instance URLs
    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Registry used for lookups
    #[must_use]
    pub fn registry(&self) -> &dyn Registry {
        self.registry.as_ref()
    }

    /// Call `call` on the first instance that answers
    ///
    /// # Errors
    ///
    /// Only registry failures are errors; per-instance failures end up in
    /// `Outcome::AllInstancesFailed`.
    pub async fn invoke<T: DeserializeOwned>(
        &self,
        call: &Call<'_>,
        body: Option<Bytes>,
    ) -> Result<Outcome<T>> {
        let instances = self.lookup(call.service).await?;
        if instances.is_empty() {
            warn!(service = call.service, "No instances registered");
            return Ok(Outcome::NoInstancesRegistered {
                service: call.service.to_string(),
            });
        }

        let mut failures = Vec::with_capacity(instances.len());
        for instance in instances {
            match self.attempt::<T>(call, &instance, body.clone()).await {
                Ok(envelope) => {
                    info!(
                        service = call.service,
                        instance = %instance,
                        message = %envelope.message,
                        "Got response"
                    );
                    return Ok(Outcome::Succeeded { instance, envelope });
                }
                Err(failure) => failures.push(failure),
            }
        }

        error!(
            service = call.service,
            path = call.path,
            attempts = failures.len(),
            "All instances failed"
        );
        Ok(Outcome::AllInstancesFailed {
            service: call.service.to_string(),
            failures,
        })
    }

    /// Call `call` on every instance
    ///
    /// # Errors
    ///
    /// Only registry failures are errors.
    pub async fn broadcast<T: DeserializeOwned>(
        &self,
        call: &Call<'_>,
        body: Option<Bytes>,
    ) -> Result<BroadcastReport<T>> {
        let instances = self.lookup(call.service).await?;
        if instances.is_empty() {
            warn!(service = call.service, "No instances registered");
        }

        let mut report = BroadcastReport {
            service: call.service.to_string(),
            delivered: Vec::new(),
            failures: Vec::new(),
        };

        for instance in instances {
            match self.attempt::<T>(call, &instance, body.clone()).await {
                Ok(envelope) => {
                    info!(
                        service = call.service,
                        instance = %instance,
                        message = %envelope.message,
                        "Delivered"
                    );
                    report.delivered.push((instance, envelope));
                }
                Err(failure) => report.failures.push(failure),
            }
        }

        Ok(report)
    }

    async fn lookup(&self, service: &str) -> Result<Vec<ServiceInstance>> {
        self.registry.list_instances(service).await.inspect_err(|e| {
            error!(service, error = %e, "Failed to get instances from discovery");
        })
    }

    /// One instance: send, check status, decode. The response is dropped on
    /// every path before returning.
    async fn attempt<T: DeserializeOwned>(
        &self,
        call: &Call<'_>,
        instance: &ServiceInstance,
        body: Option<Bytes>,
    ) -> std::result::Result<Envelope<T>, InstanceFailure> {
        let fail = |stage: FailureStage, e: Error| {
            warn!(
                service = call.service,
                instance = %instance,
                stage = %stage,
                error = %e,
                "Instance failed"
            );
            InstanceFailure::new(instance, stage, &e)
        };

        let url = instance
            .endpoint(&self.scheme, call.path)
            .map_err(|e| fail(FailureStage::Transport, e))?;
        info!(service = call.service, url = %url, method = %call.method, "Calling instance");

        let response = self
            .transport
            .send(call.method.clone(), &url, &self.credentials, body)
            .await
            .map_err(|e| match e {
                Error::BodyRead(_) => fail(FailureStage::Read, e),
                e => fail(FailureStage::Transport, e),
            })?;

        if !response.is_success() {
            return Err(fail(
                FailureStage::Transport,
                Error::Transport(format!("HTTP {} from {url}", response.status)),
            ));
        }

        envelope::decode::<T>(&response.body).map_err(|e| fail(FailureStage::Decode, e))
    }
}

impl fmt::Debug for FailoverInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailoverInvoker")
            .field("credentials", &self.credentials)
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}
