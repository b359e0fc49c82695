//! Configuration management

use std::{path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthMode, Credentials};
use crate::{Error, Result};

/// Prefix for environment overrides (`CUTTLE_SDK_DISCOVERY__ADDRESS=...`)
pub const ENV_PREFIX: &str = "CUTTLE_SDK_";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Environment files to load before reading environment variables.
    /// Paths support ~ expansion. Missing files are skipped.
    pub env_files: Vec<String>,
    /// Discovery registry configuration
    pub discovery: DiscoveryConfig,
    /// Caller credentials and how they are attached
    pub auth: AuthConfig,
    /// Transport retry configuration
    pub retry: RetryConfig,
    /// Remote service configuration
    pub services: ServicesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env_files: default_env_files(),
            discovery: DiscoveryConfig::default(),
            auth: AuthConfig::default(),
            retry: RetryConfig::default(),
            services: ServicesConfig::default(),
        }
    }
}

fn default_env_files() -> Vec<String> {
    vec![".env".to_string()]
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Precedence, lowest first: defaults, YAML file, `DISCOVERY_URL` /
    /// `DISCOVERY_TOKEN` / `APP_TOKEN`, then `CUTTLE_SDK_*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // Env files must be in the process environment before the env providers run
        let env_files: Vec<String> = figment
            .extract_inner("env_files")
            .unwrap_or_else(|_| default_env_files());
        load_env_files(&env_files);

        figment = figment
            .merge(legacy_env())
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment.extract().map_err(|e| Error::Config(e.to_string()))
    }
}

/// Variable names used by deployments that predate the prefixed scheme
fn legacy_env() -> Env {
    Env::raw()
        .only(&["DISCOVERY_URL", "DISCOVERY_TOKEN", "APP_TOKEN"])
        .map(|key| match key.as_str().to_ascii_lowercase().as_str() {
            "discovery_url" => "discovery.address".into(),
            "discovery_token" => "discovery.token".into(),
            "app_token" => "auth.access_token".into(),
            _ => key.as_str().to_owned().into(),
        })
}

/// Load environment files into the process environment.
/// Supports ~ expansion. Files that don't exist are silently skipped.
fn load_env_files(paths: &[String]) {
    for path_str in paths {
        let expanded = if path_str.starts_with('~') {
            if let Some(home) = dirs::home_dir() {
                path_str.replacen('~', &home.display().to_string(), 1)
            } else {
                path_str.clone()
            }
        } else {
            path_str.clone()
        };

        let path = Path::new(&expanded);
        if path.exists() {
            match dotenvy::from_path(path) {
                Ok(()) => {
                    tracing::info!("Loaded env file: {expanded}");
                }
                Err(e) => {
                    tracing::warn!("Failed to load env file {expanded}: {e}");
                }
            }
        } else {
            tracing::debug!("Env file not found (skipped): {expanded}");
        }
    }
}

/// Discovery registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Registry address, `host:port` or `scheme://host:port`
    pub address: String,
    /// Registry ACL token (empty = anonymous)
    pub token: String,
    /// Scheme used when `address` carries none
    pub scheme: String,
    /// Timeout of one registry query
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8500".to_string(),
            token: String::new(),
            scheme: "http".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// How the access token is attached to outgoing requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthModeKind {
    /// Header named by `token_key`
    #[default]
    Header,
    /// `Authorization: Bearer`
    Bearer,
    /// Domain-scoped cookie named by `token_key`
    Cookie,
}

/// Caller authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Access token sent to remote services
    pub access_token: String,
    /// Header or cookie name carrying the token
    pub token_key: String,
    /// Attachment mode
    pub mode: AuthModeKind,
    /// Cookie domain for `cookie` mode; unset scopes the cookie to each called instance
    pub cookie_domain: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            token_key: "auth-token".to_string(),
            mode: AuthModeKind::Header,
            cookie_domain: None,
        }
    }
}

impl AuthConfig {
    /// Credentials carried per call
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.access_token, &self.token_key)
    }

    /// Resolve the transport auth mode
    #[must_use]
    pub fn auth_mode(&self) -> AuthMode {
        match self.mode {
            AuthModeKind::Header => AuthMode::Header,
            AuthModeKind::Bearer => AuthMode::Bearer,
            AuthModeKind::Cookie => AuthMode::Cookie {
                domain: self.cookie_domain.clone().filter(|d| !d.is_empty()),
            },
        }
    }
}

/// Retry configuration for a single transport call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries (disabled = one attempt)
    pub enabled: bool,
    /// Total attempts per call, including the first
    pub max_attempts: u32,
    /// Initial backoff duration
    #[serde(with = "humantime_serde")]
    pub initial_backoff: Duration,
    /// Maximum backoff duration
    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,
    /// Backoff multiplier
    pub multiplier: f64,
    /// Upper bound of the random jitter added to each backoff
    #[serde(with = "humantime_serde")]
    pub max_jitter: Duration,
    /// Timeout of one HTTP attempt
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 4,
            initial_backoff: Duration::from_millis(2),
            max_backoff: Duration::from_millis(9),
            multiplier: 2.0,
            max_jitter: Duration::from_millis(2),
            request_timeout: Duration::from_millis(1000),
        }
    }
}

/// Remote service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Scheme for instance URLs
    pub scheme: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
        }
    }
}

/// Custom humantime serde module for Duration
pub mod humantime_serde {
    use std::time::Duration;

    use serde::{self, Deserialize, Deserializer, Serializer};

    /// Serialize Duration to human-readable string (e.g., "30s", "250ms")
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the serializer fails.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_nanos() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    /// Deserialize human-readable duration string (e.g., "30s", "5m", "100ms")
    ///
    /// # Errors
    ///
    /// Returns a deserialization error if the string cannot be parsed as a duration.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    pub(crate) fn parse(s: &str) -> Result<Duration, std::num::ParseIntError> {
        let s = s.trim();
        // "ms" before "s" and "m"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim().parse::<u64>().map(Duration::from_millis)
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim().parse::<u64>().map(Duration::from_secs)
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim().parse::<u64>().map(|m| Duration::from_secs(m * 60))
        } else {
            // Assume seconds
            s.parse::<u64>().map(Duration::from_secs)
        }
    }
}
