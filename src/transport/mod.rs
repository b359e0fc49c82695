//! Transport implementations for calling service instances

mod http;

pub use self::http::HttpTransport;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, StatusCode, header::HeaderMap};
use url::Url;

use crate::{Result, auth::Credentials};

/// A fully read response
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// Final HTTP status
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
}

impl TransportResponse {
    /// Whether the status is 2xx
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Transport trait: one request with its own retry budget
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and read the whole response
    ///
    /// Fails with `Error::Transport` once the retry budget is spent and with
    /// `Error::BodyRead` if the body cannot be read.
    async fn send(
        &self,
        method: Method,
        url: &Url,
        credentials: &Credentials,
        body: Option<Bytes>,
    ) -> Result<TransportResponse>;
}
