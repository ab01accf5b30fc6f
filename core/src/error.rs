//! Error types for the keymanager client core.
//!
//! # Design
//! Documented error statuses (400, 401, 403, 404, 500) are *not* errors here:
//! the resolver returns them as `Parsed::ApiError` values. `ApiError` only
//! covers misuse of the core (`ModelClassUnspecified`), the opt-in strict mode
//! for undocumented statuses (`UnexpectedStatus`), and JSON failures.

use thiserror::Error;

/// Result type alias for core operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    /// A 200 response arrived for an operation that names no success model.
    #[error("Response body received but no response model specified: {status}")]
    ModelClassUnspecified { status: u16, content: Vec<u8> },

    /// Undocumented status with `raise_on_unexpected_status` enabled.
    #[error("Unexpected status code: {status}")]
    UnexpectedStatus { status: u16, content: Vec<u8> },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The response body could not be decoded into the expected model.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Status code carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ModelClassUnspecified { status, .. } | Self::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            Self::Serialization(_) | Self::Deserialization(_) | Self::Config(_) => None,
        }
    }

    /// Raw response body carried by the error, if any.
    #[must_use]
    pub fn content(&self) -> Option<&[u8]> {
        match self {
            Self::ModelClassUnspecified { content, .. } | Self::UnexpectedStatus { content, .. } => {
                Some(content)
            }
            Self::Serialization(_) | Self::Deserialization(_) | Self::Config(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_status_message_names_code() {
        let err = ApiError::UnexpectedStatus {
            status: 407,
            content: b"{}".to_vec(),
        };
        assert_eq!(err.to_string(), "Unexpected status code: 407");
        assert_eq!(err.status(), Some(407));
        assert_eq!(err.content(), Some(&b"{}"[..]));
    }

    #[test]
    fn config_error_has_no_status() {
        let err = ApiError::config("base_url cannot be empty");
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("base_url cannot be empty"));
    }
}
