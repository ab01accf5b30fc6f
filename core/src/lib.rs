//! IO-free client core for the Ethereum validator keymanager API.
//!
//! # Overview
//! Builds `HttpRequest` values and resolves `HttpResponse` values without
//! touching the network (host-does-IO pattern). The caller executes the
//! actual HTTP round trip, so the core is deterministic and testable.
//!
//! # Design
//! - `KeyManagerClient` is stateless; it holds only a `ClientConfig`.
//! - Each API operation is an `Operation<T>` built by a `KeyManagerClient`
//!   method: the request to send plus the model a 200 body decodes into.
//!   Blocking and async hosts execute the same value.
//! - `response::resolve` maps a status code to `Parsed::{Success, ApiError,
//!   Empty, Unresolved}`; documented error statuses are values, not errors.
//! - Models keep unknown JSON fields in an `extra` map so they survive a
//!   decode/encode round trip.

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod response;
pub mod types;

pub use client::{KeyManagerClient, Operation, API_PREFIX};
pub use config::{ClientConfig, TlsVerification, DEFAULT_TIMEOUT};
pub use error::{ApiError, ApiResult};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use response::{Decoder, Parsed, Response};
pub use types::*;
