//! Stateless request builder and response resolver for the keymanager API.
//!
//! # Design
//! `KeyManagerClient` holds only a `ClientConfig` and carries no mutable state
//! between calls. Each endpoint method (see `endpoints`) returns an
//! `Operation<T>`: the `HttpRequest` to send plus what to decode a 200 body
//! into. The caller executes the round trip and hands the `HttpResponse` back
//! to `Operation::resolve`, keeping the core deterministic and free of I/O.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::response::{self, Decoder, Response};

/// Every endpoint lives under this prefix.
pub const API_PREFIX: &str = "eth/v1";

/// Stateless, IO-free client for the keymanager API.
#[derive(Debug, Clone)]
pub struct KeyManagerClient {
    config: ClientConfig,
}

impl KeyManagerClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Assemble the request for `method <base_url>/eth/v1/<endpoint>`.
    pub fn build_request<B: Serialize>(
        &self,
        endpoint: &str,
        method: HttpMethod,
        body: Option<&B>,
    ) -> ApiResult<HttpRequest> {
        let url = format!(
            "{}/{API_PREFIX}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );

        let mut headers = self.config.get_headers();
        let body = match body {
            Some(body) => {
                headers.insert("content-type".to_string(), "application/json".to_string());
                Some(serde_json::to_string(body).map_err(ApiError::Serialization)?)
            }
            None => None,
        };

        debug!(%method, %url, has_body = body.is_some(), "built request");

        Ok(HttpRequest {
            method,
            url,
            headers,
            cookies: self.config.get_cookies(),
            timeout: self.config.get_timeout(),
            follow_redirects: self.config.follow_redirects,
            body,
        })
    }

    /// Build an operation whose 200 body decodes into `T`.
    pub(crate) fn operation<T, B: Serialize>(
        &self,
        endpoint: &str,
        method: HttpMethod,
        body: Option<&B>,
        decoder: Option<Decoder<T>>,
    ) -> ApiResult<Operation<T>> {
        Ok(Operation {
            request: self.build_request(endpoint, method, body)?,
            decoder,
            raise_on_unexpected_status: self.config.raise_on_unexpected_status,
        })
    }
}

/// A single keymanager call: the request to send and how to read the reply.
///
/// Operations are transport-agnostic. The same value can be executed by a
/// blocking or a non-blocking host; both resolve through `resolve`.
#[derive(Clone)]
pub struct Operation<T> {
    request: HttpRequest,
    decoder: Option<Decoder<T>>,
    raise_on_unexpected_status: bool,
}

impl<T> fmt::Debug for Operation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("request", &self.request)
            .field("expects_body", &self.decoder.is_some())
            .field("raise_on_unexpected_status", &self.raise_on_unexpected_status)
            .finish()
    }
}

impl<T> Operation<T> {
    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    /// Whether a 200 reply has a model to decode into.
    pub fn expects_body(&self) -> bool {
        self.decoder.is_some()
    }

    pub fn resolve(&self, response: HttpResponse) -> ApiResult<Response<T>> {
        response::resolve(response, self.decoder, self.raise_on_unexpected_status)
    }
}
