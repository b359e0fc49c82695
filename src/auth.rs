//! Per-call credentials and request auth decoration

use reqwest::header::{AUTHORIZATION, COOKIE, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::{Error, Result};

/// Default header/cookie name used by platform services
pub const DEFAULT_TOKEN_KEY: &str = "auth-token";

/// Access token plus the key it is sent under
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Access token
    pub access_token: String,
    /// Header or cookie name
    pub token_key: String,
}

impl Credentials {
    /// Create credentials
    pub fn new(access_token: impl Into<String>, token_key: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_key: token_key.into(),
        }
    }

    /// Credentials sent under the default `auth-token` key
    pub fn with_default_key(access_token: impl Into<String>) -> Self {
        Self::new(access_token, DEFAULT_TOKEN_KEY)
    }
}

// Tokens never end up in logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("token_key", &self.token_key)
            .finish()
    }
}

/// How credentials are attached, chosen by transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// `<token_key>: <token>`
    #[default]
    Header,
    /// `Authorization: Bearer <token>`
    Bearer,
    /// `Cookie: <token_key>=<token>`
    ///
    /// With a `domain` the cookie only goes to hosts within it, otherwise it is
    /// scoped to whichever instance is being called.
    Cookie {
        /// Cookie domain
        domain: Option<String>,
    },
}

impl AuthMode {
    /// Add auth headers for a request to `url`
    ///
    /// An empty token adds nothing.
    ///
    /// # Errors
    ///
    /// Returns a config error if the key or token is not a valid header value.
    /// The token itself is never included in the error.
    pub fn decorate(
        &self,
        headers: &mut HeaderMap,
        url: &Url,
        credentials: &Credentials,
    ) -> Result<()> {
        if credentials.access_token.is_empty() {
            return Ok(());
        }

        match self {
            Self::Header => {
                let name: HeaderName = credentials.token_key.parse().map_err(|_| {
                    Error::Config(format!("Invalid token header name '{}'", credentials.token_key))
                })?;
                headers.insert(name, sensitive_value(&credentials.access_token)?);
            }
            Self::Bearer => {
                headers.insert(
                    AUTHORIZATION,
                    sensitive_value(&format!("Bearer {}", credentials.access_token))?,
                );
            }
            Self::Cookie { domain } => {
                if domain.as_deref().is_some_and(|d| !domain_matches(url, d)) {
                    return Ok(());
                }
                headers.insert(
                    COOKIE,
                    sensitive_value(&format!(
                        "{}={}",
                        credentials.token_key, credentials.access_token
                    ))?,
                );
            }
        }

        Ok(())
    }
}

fn sensitive_value(value: &str) -> Result<HeaderValue> {
    let mut value: HeaderValue = value
        .parse()
        .map_err(|_| Error::Config("Invalid credential format".to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Cookie domain matching: exact host or a subdomain of it
fn domain_matches(url: &Url, domain: &str) -> bool {
    let domain = domain.trim_start_matches('.').to_ascii_lowercase();
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    host == domain || host.ends_with(&format!(".{domain}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_header_mode_uses_token_key() {
        let mut headers = HeaderMap::new();
        AuthMode::Header
            .decorate(
                &mut headers,
                &url("http://10.0.0.1:8080/dict/remove"),
                &Credentials::with_default_key("tok"),
            )
            .unwrap();
        assert_eq!(headers.get("auth-token").unwrap(), "tok");
    }

    #[test]
    fn test_bearer_mode() {
        let mut headers = HeaderMap::new();
        AuthMode::Bearer
            .decorate(&mut headers, &url("http://svc:80/"), &Credentials::with_default_key("tok"))
            .unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer tok");
    }

    #[test]
    fn test_cookie_mode_is_domain_scoped() {
        let mode = AuthMode::Cookie {
            domain: Some(".cuttle.ai".to_string()),
        };
        let creds = Credentials::with_default_key("tok");

        let mut headers = HeaderMap::new();
        mode.decorate(&mut headers, &url("http://api.cuttle.ai:8080/x"), &creds)
            .unwrap();
        assert_eq!(headers.get(COOKIE).unwrap(), "auth-token=tok");

        let mut headers = HeaderMap::new();
        mode.decorate(&mut headers, &url("http://notcuttle.ai/x"), &creds)
            .unwrap();
        assert!(headers.get(COOKIE).is_none());
    }

    #[test]
    fn test_cookie_without_domain_follows_instance() {
        let mode = AuthMode::Cookie { domain: None };
        let creds = Credentials::with_default_key("tok");

        for target in ["http://10.0.0.7:8080/dict/remove", "http://[::1]:9000/x"] {
            let mut headers = HeaderMap::new();
            mode.decorate(&mut headers, &url(target), &creds).unwrap();
            assert_eq!(headers.get(COOKIE).unwrap(), "auth-token=tok");
        }
    }

    #[test]
    fn test_empty_token_adds_nothing() {
        let mut headers = HeaderMap::new();
        AuthMode::Header
            .decorate(&mut headers, &url("http://svc/"), &Credentials::with_default_key(""))
            .unwrap();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_debug_redacts_token() {
        let creds = Credentials::with_default_key("super-secret");
        assert!(!format!("{creds:?}").contains("super-secret"));
    }
}
