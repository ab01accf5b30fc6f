//! Endpoint-specific operation builders.
//!
//! Each module adds methods to `KeyManagerClient` for one resource group of
//! the keymanager API. Methods return an `Operation<T>` and never perform I/O.
//!
//! | Module | Endpoints |
//! |--------|-----------|
//! | `local_keys` | `/eth/v1/keystores` |
//! | `remote_keys` | `/eth/v1/remotekeys` |
//! | `gas_limit` | `/eth/v1/validator/{pubkey}/gas_limit` |
//! | `fee_recipient` | `/eth/v1/validator/{pubkey}/feerecipient` |

pub mod fee_recipient;
pub mod gas_limit;
pub mod local_keys;
pub mod remote_keys;

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::{ClientConfig, HttpResponse, KeyManagerClient};

    pub const PUBKEY: &str = "0x88a471158d618a8f9997dcb2cc1921411392d82d00e339ccf912fd9335bd42f97c9de046280d9d5f681a8e73a7d3baad";

    pub fn client() -> KeyManagerClient {
        KeyManagerClient::new(ClientConfig::authenticated("http://localhost:8080", "test_token"))
    }

    pub fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse::new(status, body.as_bytes().to_vec())
    }

    pub const ERROR_CASES: [(u16, &str); 5] = [
        (400, r#"{"code":400,"message":"Bad request. Request was malformed and could not be processed","stacktraces":[]}"#),
        (401, r#"{"code":401,"message":"UNAUTHORIZED: missing Authorization header","stacktraces":[]}"#),
        (403, r#"{"code":403,"message":"FORBIDDEN: Invalid auth token: Bearer invalid_token","stacktraces":[]}"#),
        (404, r#"{"code":404,"message":"NOT_FOUND: no validator found with pubkey 0x88a4","stacktraces":[]}"#),
        (500, r#"{"code":500,"message":"Internal Server Error","stacktraces":[]}"#),
    ];
}
