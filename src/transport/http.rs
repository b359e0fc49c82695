//! HTTP transport with bounded retry and auth decoration

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{
    Client, Method,
    header::{self, HeaderMap, HeaderValue},
};
use url::Url;

use super::{Transport, TransportResponse};
use crate::auth::{AuthMode, Credentials};
use crate::config::RetryConfig;
use crate::retry::{RetryPolicy, with_retry};
use crate::{Error, Result};

/// HTTP transport for platform services
pub struct HttpTransport {
    /// HTTP client (carries the per-attempt timeout)
    client: Client,
    /// Retry policy for one call
    retry: RetryPolicy,
    /// How credentials are attached
    auth: AuthMode,
}

impl HttpTransport {
    /// Create a new HTTP transport
    ///
    /// `retry.request_timeout` bounds each attempt.
    pub fn new(retry: &RetryConfig, auth: AuthMode) -> Result<Self> {
        let client = Client::builder()
            .timeout(retry.request_timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(Self {
            client,
            retry: RetryPolicy::new(retry),
            auth,
        })
    }

    /// Auth mode in use
    #[must_use]
    pub fn auth_mode(&self) -> &AuthMode {
        &self.auth
    }

    fn build_headers(
        &self,
        url: &Url,
        credentials: &Credentials,
        has_body: bool,
    ) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if has_body {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        self.auth.decorate(&mut headers, url, credentials)?;
        Ok(headers)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        url: &Url,
        credentials: &Credentials,
        body: Option<Bytes>,
    ) -> Result<TransportResponse> {
        let headers = self.build_headers(url, credentials, body.is_some())?;
        let (headers, body, method) = (&headers, body.as_ref(), &method);

        let response = with_retry(&self.retry, url.as_str(), || async move {
            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .headers(headers.clone());
            if let Some(body) = body {
                request = request.body(body.clone());
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::Transport(format!("Request failed: {e}")))?;

            // 5xx is transient and spends an attempt; anything else goes to the caller
            let status = response.status();
            if status.is_server_error() {
                return Err(Error::Transport(format!("HTTP {status} from {url}")));
            }

            Ok(response)
        })
        .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::BodyRead(e.to_string()))?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
