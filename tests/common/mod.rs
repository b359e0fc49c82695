//! Shared helpers: local HTTP servers standing in for platform services

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use cuttle_sdk::auth::{AuthMode, Credentials};
use cuttle_sdk::config::RetryConfig;
use cuttle_sdk::discovery::{ServiceInstance, StaticRegistry};
use cuttle_sdk::invoker::FailoverInvoker;
use cuttle_sdk::transport::HttpTransport;
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral localhost port
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// An address nothing listens on
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Instance of `service` at `addr`
pub fn instance(service: &str, addr: SocketAddr) -> ServiceInstance {
    ServiceInstance::new(service, addr.ip().to_string(), addr.port())
}

/// Observed policy shape with millisecond-scale delays
pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        enabled: true,
        max_attempts: 4,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
        multiplier: 2.0,
        max_jitter: Duration::from_millis(1),
        request_timeout: Duration::from_secs(2),
    }
}

/// HTTP invoker over a fixed instance list, `auth-token` header auth
pub fn http_invoker(instances: Vec<ServiceInstance>, token: &str) -> FailoverInvoker {
    let transport = HttpTransport::new(&fast_retry(), AuthMode::Header).unwrap();
    FailoverInvoker::new(
        Arc::new(StaticRegistry::new(instances)),
        Arc::new(transport),
        Credentials::with_default_key(token),
    )
}

/// Request counter shared with a handler
#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    /// Record a request, returning how many came before it
    pub fn hit(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst)
    }

    /// Requests seen
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
