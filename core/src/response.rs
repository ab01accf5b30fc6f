//! Response resolution: status code in, typed envelope out.
//!
//! The status code is the only discriminant, checked in this order:
//!
//! | Status | Outcome |
//! |--------|---------|
//! | 200, no decoder | `ApiError::ModelClassUnspecified` |
//! | 200 | `Parsed::Success` |
//! | 202, 204 | `Parsed::Empty` |
//! | 400, 401, 403, 404, 500 | `Parsed::ApiError` |
//! | anything else | `ApiError::UnexpectedStatus` if raising, else `Parsed::Unresolved` |

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::http::HttpResponse;
use crate::types::ErrorResponse;

/// Statuses whose body is an `ErrorResponse`.
pub const ERROR_STATUSES: [u16; 5] = [400, 401, 403, 404, 500];

/// Decodes a 200 body into the operation's success model.
pub type Decoder<T> = fn(&[u8]) -> serde_json::Result<T>;

/// The `Decoder` for any JSON model.
pub fn json_decoder<T: DeserializeOwned>() -> Decoder<T> {
    |body| serde_json::from_slice(body)
}

/// Parsed value of a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    /// 200 decoded into the operation's model.
    Success(T),
    /// One of the documented error statuses.
    ApiError(ErrorResponse),
    /// 202 or 204; no body expected.
    Empty,
    /// Undocumented status passed through; inspect `Response::status`.
    Unresolved,
}

impl<T> Parsed<T> {
    pub fn success(self) -> Option<T> {
        match self {
            Parsed::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_success(&self) -> Option<&T> {
        match self {
            Parsed::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn api_error(&self) -> Option<&ErrorResponse> {
        match self {
            Parsed::ApiError(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Parsed::Empty)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Parsed<U> {
        match self {
            Parsed::Success(value) => Parsed::Success(f(value)),
            Parsed::ApiError(error) => Parsed::ApiError(error),
            Parsed::Empty => Parsed::Empty,
            Parsed::Unresolved => Parsed::Unresolved,
        }
    }
}

/// Envelope returned by every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T> {
    pub status: u16,
    /// Raw body bytes as received.
    pub content: Vec<u8>,
    pub headers: Vec<(String, String)>,
    pub parsed: Parsed<T>,
}

impl<T> Response<T> {
    /// Drop the envelope and keep the parsed value.
    pub fn into_parsed(self) -> Parsed<T> {
        self.parsed
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Classify `response` and decode its body where the status calls for it.
pub fn resolve<T>(
    response: HttpResponse,
    decoder: Option<Decoder<T>>,
    raise_on_unexpected_status: bool,
) -> ApiResult<Response<T>> {
    let parsed = parse(&response, decoder, raise_on_unexpected_status)?;
    Ok(Response {
        status: response.status,
        content: response.body,
        headers: response.headers,
        parsed,
    })
}

fn parse<T>(
    response: &HttpResponse,
    decoder: Option<Decoder<T>>,
    raise_on_unexpected_status: bool,
) -> ApiResult<Parsed<T>> {
    let status = response.status;
    match (status, decoder) {
        (200, None) => Err(ApiError::ModelClassUnspecified {
            status,
            content: response.body.clone(),
        }),
        (200, Some(decode)) => {
            let value = decode(&response.body).map_err(ApiError::Deserialization)?;
            debug!(status, "decoded success body");
            Ok(Parsed::Success(value))
        }
        (202 | 204, _) => Ok(Parsed::Empty),
        _ => {
            if let Some(error) = parse_error_response(response)? {
                debug!(status, message = %error.message, "server reported error");
                return Ok(Parsed::ApiError(error));
            }
            if raise_on_unexpected_status {
                warn!(status, "unexpected status, raising");
                return Err(ApiError::UnexpectedStatus {
                    status,
                    content: response.body.clone(),
                });
            }
            warn!(status, "unexpected status, passing envelope through");
            Ok(Parsed::Unresolved)
        }
    }
}

/// Decode the body as an `ErrorResponse` if the status is a documented error.
pub fn parse_error_response(response: &HttpResponse) -> ApiResult<Option<ErrorResponse>> {
    if !ERROR_STATUSES.contains(&response.status) {
        return Ok(None);
    }
    serde_json::from_slice(&response.body)
        .map(Some)
        .map_err(ApiError::Deserialization)
}
