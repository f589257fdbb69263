//! Client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{Error, Result};
pub use crate::transport::RetrySettings;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://rest.tsheets.com/api/v1/";

/// Minimum TLS protocol version accepted by the HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TlsVersion {
    /// TLS 1.0
    #[serde(rename = "1.0")]
    Tls10,
    /// TLS 1.1
    #[serde(rename = "1.1")]
    Tls11,
    /// TLS 1.2
    #[default]
    #[serde(rename = "1.2")]
    Tls12,
    /// TLS 1.3
    #[serde(rename = "1.3")]
    Tls13,
}

/// Settings for a client instance.
///
/// The access token is never serialized.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API base URL, ending with a slash.
    pub base_url: String,
    /// OAuth bearer token.
    #[serde(skip_serializing)]
    pub access_token: String,
    /// Per-request timeout.
    pub timeout_seconds: u64,
    /// User-Agent header value.
    pub user_agent: String,
    /// Minimum TLS version; applies to the whole client.
    pub min_tls_version: TlsVersion,
    /// Retry policy for transient failures.
    pub retry: RetrySettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: String::new(),
            timeout_seconds: 30,
            user_agent: format!("tsheets-rust/{}", env!("CARGO_PKG_VERSION")),
            min_tls_version: TlsVersion::default(),
            retry: RetrySettings::default(),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration with the given access token.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            ..Self::default()
        }
    }

    /// Parses a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Configuration(e.to_string()))
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the minimum TLS version.
    #[must_use]
    pub fn with_min_tls_version(mut self, version: TlsVersion) -> Self {
        self.min_tls_version = version;
        self
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Returns the base URL with exactly one trailing slash.
    #[must_use]
    pub fn normalized_base_url(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }

    /// Checks that the configuration can build a client.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(Error::Configuration(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.access_token.trim().is_empty() {
            return Err(Error::Configuration("access_token is empty".to_string()));
        }
        if self.timeout_seconds == 0 {
            return Err(Error::Configuration(
                "timeout_seconds must be positive".to_string(),
            ));
        }
        if self.retry.multiplier < 0.0 || !self.retry.exponent.is_finite() {
            return Err(Error::Configuration(
                "retry multiplier must be non-negative and exponent finite".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("timeout_seconds", &self.timeout_seconds)
            .field("user_agent", &self.user_agent)
            .field("min_tls_version", &self.min_tls_version)
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.min_tls_version, TlsVersion::Tls12);
        assert_eq!(config.retry.max_retry_count, 3);
    }

    #[test]
    fn test_token_is_never_serialized() {
        let json = serde_json::to_string(&ClientConfig::new("secret-token")).unwrap();
        assert!(!json.contains("secret-token"));
        assert!(!format!("{:?}", ClientConfig::new("secret-token")).contains("secret-token"));
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = ClientConfig::from_json(
            r#"{"access_token": "t", "min_tls_version": "1.3", "retry": {"max_retry_count": 0}}"#,
        )
        .unwrap();

        assert_eq!(config.access_token, "t");
        assert_eq!(config.min_tls_version, TlsVersion::Tls13);
        assert_eq!(config.retry.max_retry_count, 0);
        assert_eq!(config.retry.multiplier, 1.5);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            ClientConfig::from_json("not json"),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::new("t").validate().is_ok());
        assert!(ClientConfig::default().validate().is_err());
        assert!(ClientConfig::new("t")
            .with_base_url("ftp://example.com")
            .validate()
            .is_err());
        assert!(ClientConfig::new("t")
            .with_timeout_seconds(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_normalized_base_url() {
        let config = ClientConfig::new("t").with_base_url("http://localhost:8080/api///");
        assert_eq!(config.normalized_base_url(), "http://localhost:8080/api/");
    }
}
