use std::path::PathBuf;

use keymanager_core::ApiError;
use thiserror::Error;

use crate::keymanager::{BASE_URL_ENV, TOKEN_ENV};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("missing keymanager configuration: pass base_url and token or set {BASE_URL_ENV} and {TOKEN_ENV}")]
    ConfigurationMissing,

    /// Connection, TLS or timeout failure of the blocking transport.
    #[error("blocking transport error: {0}")]
    Blocking(#[from] ureq::Error),

    /// Connection, TLS or timeout failure of the async transport.
    #[error("async transport error: {0}")]
    Async(#[from] reqwest::Error),

    #[error("failed to load CA bundle {}: {reason}", path.display())]
    Certificate { path: PathBuf, reason: String },

    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

impl Error {
    /// Status code carried by resolver errors, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Blocking(ureq::Error::Timeout(_)) => true,
            Self::Async(e) => e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_missing_names_both_variables() {
        let message = Error::ConfigurationMissing.to_string();
        assert!(message.contains("ETH_2_KEY_MANAGER_API_BASE_URL"));
        assert!(message.contains("ETH_2_KEY_MANAGER_API_TOKEN"));
    }

    #[test]
    fn api_errors_keep_their_status() {
        let err = Error::from(ApiError::UnexpectedStatus {
            status: 407,
            content: b"proxy".to_vec(),
        });
        assert_eq!(err.status(), Some(407));
        assert_eq!(err.to_string(), "Unexpected status code: 407");
        assert!(!err.is_timeout());
    }

    #[test]
    fn certificate_error_mentions_path() {
        let err = Error::Certificate {
            path: PathBuf::from("/etc/ca.pem"),
            reason: "no such file".to_string(),
        };
        assert_eq!(err.to_string(), "failed to load CA bundle /etc/ca.pem: no such file");
    }
}
