//! Connection Settings
//!
//! Endpoint and bearer token for the OpenCTI GraphQL API. Both are read once
//! and never change afterwards.

use std::fmt;
use std::time::Duration;

use crate::error::{OpenCtiError, Result};

/// Path every OpenCTI GraphQL endpoint ends with
pub const GRAPHQL_PATH: &str = "/graphql";

/// Request timeout used unless the caller overrides it
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable OpenCTI connection settings
#[derive(Clone)]
pub struct OpenCtiConfig {
    endpoint: String,
    token: String,
    timeout: Duration,
}

impl OpenCtiConfig {
    /// Build settings from optional values.
    ///
    /// Empty strings count as missing.
    ///
    /// # Errors
    /// Returns `OpenCtiError::Configuration` if the URL or the token is absent.
    pub fn new(url: Option<String>, token: Option<String>) -> Result<Self> {
        let url = url.filter(|u| !u.trim().is_empty());
        let token = token.filter(|t| !t.trim().is_empty());

        let (url, token) = match (url, token) {
            (Some(url), Some(token)) => (url, token),
            (None, Some(_)) => {
                return Err(OpenCtiError::Configuration("OPENCTI_URL is not set".into()))
            }
            (Some(_), None) => {
                return Err(OpenCtiError::Configuration(
                    "OPENCTI_TOKEN is not set".into(),
                ))
            }
            (None, None) => {
                return Err(OpenCtiError::Configuration(
                    "OPENCTI_URL and OPENCTI_TOKEN are not set".into(),
                ))
            }
        };

        Ok(Self {
            endpoint: normalize_endpoint(&url),
            token,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

// Keep the bearer token out of logs and panic messages.
impl fmt::Debug for OpenCtiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenCtiConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Make sure the URL ends with exactly one `/graphql`.
///
/// Accepts either a bare host (`https://cti.example.com/`) or the full path.
pub fn normalize_endpoint(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.ends_with(GRAPHQL_PATH) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, GRAPHQL_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_missing_url_fails() {
        let err = OpenCtiConfig::new(None, some("token")).unwrap_err();
        assert!(matches!(err, OpenCtiError::Configuration(_)));
    }

    #[test]
    fn test_missing_token_fails() {
        let err = OpenCtiConfig::new(some("http://localhost:8080"), None).unwrap_err();
        assert!(matches!(err, OpenCtiError::Configuration(_)));
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let err = OpenCtiConfig::new(some(""), some("  ")).unwrap_err();
        assert!(matches!(err, OpenCtiError::Configuration(_)));
    }

    #[test]
    fn test_bare_host_gets_graphql_suffix() {
        let config = OpenCtiConfig::new(some("http://localhost:8080"), some("t")).unwrap();
        assert_eq!(config.endpoint(), "http://localhost:8080/graphql");
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(normalize_endpoint("https://cti.local/"), "https://cti.local/graphql");
        assert_eq!(
            normalize_endpoint("https://cti.local/graphql"),
            "https://cti.local/graphql"
        );
        assert_eq!(
            normalize_endpoint("https://cti.local/graphql/"),
            "https://cti.local/graphql"
        );
        assert_eq!(
            normalize_endpoint("https://cti.local/api/graphql")
                .matches(GRAPHQL_PATH)
                .count(),
            1
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = OpenCtiConfig::new(some("http://localhost"), some("s3cr3t")).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("s3cr3t"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_with_timeout() {
        let config = OpenCtiConfig::new(some("http://localhost"), some("t"))
            .unwrap()
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }
}
