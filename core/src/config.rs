//! Transport configuration shared by every request a client builds.
//!
//! `ClientConfig` is immutable once handed to a `KeyManagerClient`; the
//! `with_*` methods take `&self` and return a modified copy.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ApiError, ApiResult};

/// Default timeout of the lower-level client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const DEFAULT_PREFIX: &str = "Bearer";
const DEFAULT_AUTH_HEADER_NAME: &str = "Authorization";

/// How the transport should treat the server's TLS certificate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TlsVerification {
    /// Verify against the platform / bundled roots.
    #[default]
    Enabled,
    /// Accept any certificate.
    Disabled,
    /// Verify against the PEM bundle at this path.
    CaBundle(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Bearer token; `None` for the unauthenticated variant.
    pub token: Option<String>,
    pub prefix: String,
    pub auth_header_name: String,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub timeout: Duration,
    pub tls: TlsVerification,
    pub raise_on_unexpected_status: bool,
    pub follow_redirects: bool,
}

impl ClientConfig {
    /// Unauthenticated configuration with the lower-level defaults.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            prefix: DEFAULT_PREFIX.to_string(),
            auth_header_name: DEFAULT_AUTH_HEADER_NAME.to_string(),
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
            timeout: DEFAULT_TIMEOUT,
            tls: TlsVerification::Enabled,
            raise_on_unexpected_status: false,
            follow_redirects: false,
        }
    }

    /// Configuration that sends `<auth_header_name>: <prefix> <token>`.
    pub fn authenticated(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::new(base_url)
        }
    }

    /// Static headers plus the generated authorization header, if any.
    pub fn get_headers(&self) -> BTreeMap<String, String> {
        let mut headers = self.headers.clone();
        if let Some(token) = &self.token {
            let value = if self.prefix.is_empty() {
                token.clone()
            } else {
                format!("{} {}", self.prefix, token)
            };
            headers.insert(self.auth_header_name.clone(), value);
        }
        headers
    }

    pub fn get_cookies(&self) -> BTreeMap<String, String> {
        self.cookies.clone()
    }

    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }

    /// Copy of this configuration with `extra` merged over the static headers.
    #[must_use]
    pub fn with_headers<I, K, V>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut next = self.clone();
        next.headers
            .extend(extra.into_iter().map(|(k, v)| (k.into(), v.into())));
        next
    }

    /// Copy of this configuration with `extra` merged over the static cookies.
    #[must_use]
    pub fn with_cookies<I, K, V>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut next = self.clone();
        next.cookies
            .extend(extra.into_iter().map(|(k, v)| (k.into(), v.into())));
        next
    }

    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_tls(&self, tls: TlsVerification) -> Self {
        Self {
            tls,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_raise_on_unexpected_status(&self, raise: bool) -> Self {
        Self {
            raise_on_unexpected_status: raise,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_follow_redirects(&self, follow: bool) -> Self {
        Self {
            follow_redirects: follow,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> ApiResult<()> {
        if self.base_url.is_empty() {
            return Err(ApiError::config("base_url cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ApiError::config(
                "base_url must start with http:// or https://",
            ));
        }

        if self.timeout.is_zero() {
            return Err(ApiError::config("timeout cannot be zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::authenticated("http://localhost:7500", "token")
            .with_headers([("header", "value")])
            .with_cookies([("cookie", "chocolate")])
    }

    #[test]
    fn lower_level_defaults() {
        let config = ClientConfig::new("http://localhost:7500");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.tls, TlsVerification::Enabled);
        assert!(!config.raise_on_unexpected_status);
        assert!(!config.follow_redirects);
        assert!(config.get_headers().is_empty());
    }

    #[test]
    fn headers_include_bearer_token() {
        let headers = config().get_headers();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["header"], "value");
        assert_eq!(headers["Authorization"], "Bearer token");
    }

    #[test]
    fn empty_prefix_sends_bare_token() {
        let mut config = config();
        config.prefix = String::new();
        config.auth_header_name = "X-Api-Key".to_string();
        assert_eq!(config.get_headers()["X-Api-Key"], "token");
    }

    #[test]
    fn with_headers_merges_without_mutating_receiver() {
        let base = config();
        let derived = base.with_headers([("header2", "value2"), ("header", "override")]);

        assert_eq!(base.headers.len(), 1);
        assert_eq!(base.headers["header"], "value");

        let headers = derived.get_headers();
        assert_eq!(headers["header"], "override");
        assert_eq!(headers["header2"], "value2");
        assert_eq!(headers["Authorization"], "Bearer token");
    }

    #[test]
    fn with_cookies_merges_without_mutating_receiver() {
        let base = config();
        let derived = base.with_cookies([("cookie2", "chocolate2")]);

        assert_eq!(base.get_cookies().len(), 1);
        let cookies = derived.get_cookies();
        assert_eq!(cookies["cookie"], "chocolate");
        assert_eq!(cookies["cookie2"], "chocolate2");
    }

    #[test]
    fn with_timeout_returns_copy() {
        let base = config();
        let derived = base.with_timeout(Duration::from_secs(30));
        assert_eq!(base.get_timeout(), Duration::from_secs(5));
        assert_eq!(derived.get_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn validation() {
        assert!(config().validate().is_ok());
        assert!(ClientConfig::new("").validate().is_err());
        assert!(ClientConfig::new("localhost:7500").validate().is_err());
        assert!(config()
            .with_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }
}
