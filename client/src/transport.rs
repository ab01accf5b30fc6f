//! Hosts that carry an `HttpRequest` over the network.
//!
//! Both transports build a fresh agent or client for every call and drop it
//! when the call returns, so no connection outlives a request. Status codes
//! are always handed back as data; only connection, TLS and timeout failures
//! become errors.

use std::future::Future;
use std::path::Path;

use keymanager_core::{HttpMethod, HttpRequest, HttpResponse, TlsVerification};
use reqwest::header::{HeaderName, HeaderValue};
use tracing::debug;

use crate::error::{Error, Result};

/// Blocking host.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Non-blocking host.
pub trait AsyncTransport {
    fn execute(&self, request: &HttpRequest) -> impl Future<Output = Result<HttpResponse>> + Send;
}

/// Reject header names or values that cannot go on the wire.
pub fn check_headers(request: &HttpRequest) -> Result<()> {
    for (name, value) in &request.headers {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::InvalidHeader(format!("name {name:?}")))?;
        HeaderValue::from_str(value)
            .map_err(|_| Error::InvalidHeader(format!("value for {name}")))?;
    }
    if let Some(cookie) = request.cookie_header() {
        HeaderValue::from_str(&cookie)
            .map_err(|_| Error::InvalidHeader("cookie".to_string()))?;
    }
    Ok(())
}

fn read_bundle(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::Certificate {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Every certificate in a PEM bundle. Private keys are skipped.
fn bundle_certificates(path: &Path, pem: &[u8]) -> Result<Vec<ureq::tls::Certificate<'static>>> {
    let invalid = |reason: String| Error::Certificate {
        path: path.to_path_buf(),
        reason,
    };
    let mut certs = Vec::new();
    for item in ureq::tls::parse_pem(pem) {
        let item = item.map_err(|e| invalid(e.to_string()))?;
        if let ureq::tls::PemItem::Certificate(cert) = item {
            certs.push(cert);
        }
    }
    if certs.is_empty() {
        return Err(invalid("no certificate in bundle".to_string()));
    }
    Ok(certs)
}

// ---------------------------------------------------------------------------
// ureq
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct UreqTransport {
    tls: TlsVerification,
}

impl UreqTransport {
    pub fn new(tls: TlsVerification) -> Self {
        Self { tls }
    }

    fn tls_config(&self) -> Result<ureq::tls::TlsConfig> {
        let builder = ureq::tls::TlsConfig::builder();
        let builder = match &self.tls {
            TlsVerification::Enabled => builder,
            TlsVerification::Disabled => builder.disable_verification(true),
            TlsVerification::CaBundle(path) => {
                let pem = read_bundle(path)?;
                let certs = bundle_certificates(path, &pem)?;
                builder.root_certs(ureq::tls::RootCerts::new_with_certs(&certs))
            }
        };
        Ok(builder.build())
    }

    fn agent(&self, request: &HttpRequest) -> Result<ureq::Agent> {
        let max_redirects = if request.follow_redirects { 10 } else { 0 };
        Ok(ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(request.timeout))
            .max_redirects(max_redirects)
            .tls_config(self.tls_config()?)
            .build()
            .new_agent())
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    request: &HttpRequest,
) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(cookie) = request.cookie_header() {
        builder = builder.header("cookie", cookie.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        check_headers(request)?;
        let agent = self.agent(request)?;
        let url = request.url.as_str();
        debug!(method = %request.method, %url, "sending blocking request");

        let result = match (request.method, &request.body) {
            (HttpMethod::Get, _) => with_headers(agent.get(url), request).call(),
            (HttpMethod::Delete, None) => with_headers(agent.delete(url), request).call(),
            (HttpMethod::Delete, Some(body)) => with_headers(agent.delete(url), request)
                .force_send_body()
                .send(body.as_bytes()),
            (HttpMethod::Post, Some(body)) => {
                with_headers(agent.post(url), request).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_headers(agent.post(url), request).send_empty(),
        };

        let mut response = result?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
            .collect();
        // No size cap, matching reqwest.
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()?;
        debug!(status, bytes = body.len(), "received blocking response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

// ---------------------------------------------------------------------------
// reqwest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    tls: TlsVerification,
}

impl ReqwestTransport {
    pub fn new(tls: TlsVerification) -> Self {
        Self { tls }
    }

    fn client(&self, request: &HttpRequest) -> Result<reqwest::Client> {
        let redirect = if request.follow_redirects {
            reqwest::redirect::Policy::default()
        } else {
            reqwest::redirect::Policy::none()
        };
        let builder = reqwest::Client::builder()
            .timeout(request.timeout)
            .redirect(redirect)
            .pool_max_idle_per_host(0);
        let builder = match &self.tls {
            TlsVerification::Enabled => builder,
            TlsVerification::Disabled => builder.danger_accept_invalid_certs(true),
            TlsVerification::CaBundle(path) => {
                let pem = read_bundle(path)?;
                let certs = reqwest::Certificate::from_pem_bundle(&pem).map_err(|e| {
                    Error::Certificate {
                        path: path.clone(),
                        reason: e.to_string(),
                    }
                })?;
                certs
                    .into_iter()
                    .fold(builder, |builder, cert| builder.add_root_certificate(cert))
            }
        };
        Ok(builder.build()?)
    }
}

impl AsyncTransport for ReqwestTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        check_headers(request)?;
        let client = self.client(request)?;
        debug!(method = %request.method, url = %request.url, "sending async request");

        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };
        let mut builder = client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(cookie) = request.cookie_header() {
            builder = builder.header(reqwest::header::COOKIE, cookie);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response.bytes().await?.to_vec();
        debug!(status, bytes = body.len(), "received async response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn request() -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: "http://127.0.0.1:1/eth/v1/keystores".to_string(),
            headers: BTreeMap::from([("Authorization".to_string(), "Bearer t".to_string())]),
            cookies: BTreeMap::new(),
            timeout: Duration::from_secs(1),
            follow_redirects: false,
            body: None,
        }
    }

    #[test]
    fn check_headers_accepts_plain_values() {
        let mut req = request();
        req.cookies.insert("session".to_string(), "abc".to_string());
        assert!(check_headers(&req).is_ok());
    }

    #[test]
    fn check_headers_rejects_newlines() {
        let mut req = request();
        req.headers.insert("X-Bad".to_string(), "a\r\nb".to_string());
        assert!(matches!(check_headers(&req), Err(Error::InvalidHeader(_))));

        let mut req = request();
        req.headers.insert("bad name".to_string(), "v".to_string());
        assert!(matches!(check_headers(&req), Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn missing_ca_bundle_is_certificate_error() {
        let tls = TlsVerification::CaBundle(PathBuf::from("/nonexistent/ca.pem"));
        let err = UreqTransport::new(tls.clone()).execute(&request()).unwrap_err();
        assert!(matches!(err, Error::Certificate { .. }));

        let err = ReqwestTransport::new(tls).client(&request()).unwrap_err();
        assert!(matches!(err, Error::Certificate { .. }));
    }

    const FIRST_ROOT: &str = "-----BEGIN CERTIFICATE-----\nZmlyc3Qtcm9vdA==\n-----END CERTIFICATE-----\n";
    const SECOND_ROOT: &str = "-----BEGIN CERTIFICATE-----\nc2Vjb25kLXJvb3Q=\n-----END CERTIFICATE-----\n";

    #[test]
    fn ca_bundle_loads_every_certificate() {
        let path = PathBuf::from("chain.pem");
        let bundle = format!("{FIRST_ROOT}{SECOND_ROOT}");
        let certs = bundle_certificates(&path, bundle.as_bytes()).unwrap();
        assert_eq!(certs.len(), 2);
        assert_eq!(certs[0].der(), b"first-root");
        assert_eq!(certs[1].der(), b"second-root");

        let file = std::env::temp_dir().join(format!("keymanager-chain-{}.pem", std::process::id()));
        std::fs::write(&file, &bundle).unwrap();
        let transport = UreqTransport::new(TlsVerification::CaBundle(file.clone()));
        assert!(transport.tls_config().is_ok());
        std::fs::remove_file(file).unwrap();
    }

    #[test]
    fn ca_bundle_without_certificates_is_rejected() {
        let path = PathBuf::from("empty.pem");
        let err = bundle_certificates(&path, b"not a pem file").unwrap_err();
        assert!(matches!(err, Error::Certificate { .. }));
    }

    #[test]
    fn connection_refused_is_transport_error() {
        let err = UreqTransport::default().execute(&request()).unwrap_err();
        assert!(matches!(err, Error::Blocking(_)));
    }

    #[tokio::test]
    async fn async_connection_refused_is_transport_error() {
        let err = ReqwestTransport::default().execute(&request()).await.unwrap_err();
        assert!(matches!(err, Error::Async(_)));
    }
}
