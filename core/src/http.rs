//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe keymanager requests and responses as plain data. The
//! core crate builds `HttpRequest` values and resolves `HttpResponse` values
//! without touching the network; `keymanager-client` (or any other host)
//! executes the round trip.
//!
//! Header and cookie maps are ordered so a request built twice from the same
//! configuration is byte-for-byte identical.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A keymanager request described as plain data.
///
/// Built fresh for every call by `KeyManagerClient::build_request`. The host
/// is responsible for sending it, honouring `timeout` and `follow_redirects`,
/// and returning the corresponding `HttpResponse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub timeout: Duration,
    pub follow_redirects: bool,
    /// Serialized JSON payload, if the endpoint takes one.
    pub body: Option<String>,
}

impl HttpRequest {
    /// Render `cookies` as a single `Cookie` header value, or `None` when
    /// there are no cookies to send.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Some(pairs.join("; "))
    }
}

/// A keymanager response described as plain data.
///
/// `body` holds the raw bytes exactly as received; it is only decoded by the
/// resolver when the status code calls for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Case-insensitive header lookup returning the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
