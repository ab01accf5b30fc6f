//! Request and response models for the keymanager API.
//!
//! # Design
//! Every model carries an `extra` map. Keys the model does not know about are
//! collected there on decode and written back on encode, so a value decoded
//! from a newer server re-encodes to the same JSON object. Optional fields are
//! `Option<Option<T>>`: the outer `None` is a missing key and is omitted on
//! encode, `Some(None)` is an explicit `null` and is written back as `null`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Unknown fields preserved across a decode/encode round trip.
pub type Extra = Map<String, Value>;

/// Missing key -> `None`, `null` -> `Some(None)`, value -> `Some(Some(v))`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::deserialize(deserializer).map(Some)
}

fn present(field: &Option<Option<String>>) -> Option<&str> {
    field.as_ref().and_then(|value| value.as_deref())
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// Error body returned with 400, 401, 403, 404 and 500 responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: i64,
    pub message: String,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub stacktraces: Option<Option<Vec<String>>>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ErrorResponse {
    /// Empty when the server sent no traces or `null`.
    pub fn stacktraces(&self) -> &[String] {
        self.stacktraces
            .as_ref()
            .and_then(|traces| traces.as_deref())
            .unwrap_or_default()
    }
}

/// A remote signer entry as reported by `GET /eth/v1/remotekeys`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignerDefinition {
    pub pubkey: String,
    /// URL of the EIP-3030 remote signer.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<Option<String>>,
    /// The key cannot be deleted through the API.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub readonly: Option<Option<bool>>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl SignerDefinition {
    pub fn url(&self) -> Option<&str> {
        present(&self.url)
    }

    pub fn readonly(&self) -> Option<bool> {
        self.readonly.flatten()
    }
}

pub type ListRemoteKeysResponseDataItem = SignerDefinition;

// ---------------------------------------------------------------------------
// Local keystores
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListKeysResponse {
    pub data: Vec<ListKeysResponseDataItem>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListKeysResponseDataItem {
    pub validating_pubkey: String,
    /// Derivation path, if present in the imported keystore.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub derivation_path: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub readonly: Option<Option<bool>>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ListKeysResponseDataItem {
    pub fn derivation_path(&self) -> Option<&str> {
        present(&self.derivation_path)
    }

    pub fn readonly(&self) -> Option<bool> {
        self.readonly.flatten()
    }
}

/// Body of `POST /eth/v1/keystores`.
///
/// `passwords[i]` must unlock `keystores[i]`; the pairing is checked by the
/// server only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportKeystoresRequest {
    /// EIP-2335 keystores, each serialized as a JSON string.
    pub keystores: Vec<String>,
    pub passwords: Vec<String>,
    /// EIP-3076 interchange data serialized as a JSON string.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub slashing_protection: Option<Option<String>>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ImportKeystoresRequest {
    pub fn new(
        keystores: Vec<String>,
        passwords: Vec<String>,
        slashing_protection: Option<String>,
    ) -> Self {
        Self {
            keystores,
            passwords,
            slashing_protection: slashing_protection.map(Some),
            extra: Extra::new(),
        }
    }

    pub fn slashing_protection(&self) -> Option<&str> {
        present(&self.slashing_protection)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKeystoreStatus {
    Imported,
    Duplicate,
    Error,
}

impl ImportKeystoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Imported => "imported",
            Self::Duplicate => "duplicate",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportKeystoresResponse {
    /// One status per `request.keystores` entry, in the same order.
    pub data: Vec<ImportKeystoresResponseDataItem>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportKeystoresResponseDataItem {
    pub status: ImportKeystoreStatus,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<Option<String>>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ImportKeystoresResponseDataItem {
    pub fn message(&self) -> Option<&str> {
        present(&self.message)
    }
}

/// Body of `DELETE /eth/v1/keystores`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteKeysRequest {
    pub pubkeys: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl DeleteKeysRequest {
    pub fn new(pubkeys: Vec<String>) -> Self {
        Self {
            pubkeys,
            extra: Extra::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteKeyStatus {
    Deleted,
    NotActive,
    NotFound,
    Error,
}

impl DeleteKeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deleted => "deleted",
            Self::NotActive => "not_active",
            Self::NotFound => "not_found",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteKeysResponse {
    /// One status per `request.pubkeys` entry, in the same order.
    pub data: Vec<DeleteKeysResponseDataItem>,
    /// EIP-3076 interchange JSON covering every `deleted` or `not_active` key.
    pub slashing_protection: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteKeysResponseDataItem {
    pub status: DeleteKeyStatus,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<Option<String>>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl DeleteKeysResponseDataItem {
    pub fn message(&self) -> Option<&str> {
        present(&self.message)
    }
}

// ---------------------------------------------------------------------------
// Remote keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRemoteKeysResponse {
    pub data: Vec<ListRemoteKeysResponseDataItem>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Body of `POST /eth/v1/remotekeys`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRemoteKeysRequest {
    pub remote_keys: Vec<ImportRemoteKeysRequestItem>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ImportRemoteKeysRequest {
    pub fn new(remote_keys: Vec<ImportRemoteKeysRequestItem>) -> Self {
        Self {
            remote_keys,
            extra: Extra::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRemoteKeysRequestItem {
    pub pubkey: String,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<Option<String>>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ImportRemoteKeysRequestItem {
    pub fn new(pubkey: impl Into<String>, url: Option<String>) -> Self {
        Self {
            pubkey: pubkey.into(),
            url: url.map(Some),
            extra: Extra::new(),
        }
    }

    pub fn url(&self) -> Option<&str> {
        present(&self.url)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportRemoteKeyStatus {
    Imported,
    Duplicate,
    Error,
}

impl ImportRemoteKeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Imported => "imported",
            Self::Duplicate => "duplicate",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRemoteKeysResponse {
    pub data: Vec<ImportRemoteKeysResponseDataItem>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRemoteKeysResponseDataItem {
    pub status: ImportRemoteKeyStatus,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<Option<String>>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ImportRemoteKeysResponseDataItem {
    pub fn message(&self) -> Option<&str> {
        present(&self.message)
    }
}

/// Body of `DELETE /eth/v1/remotekeys`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteRemoteKeysRequest {
    pub pubkeys: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl DeleteRemoteKeysRequest {
    pub fn new(pubkeys: Vec<String>) -> Self {
        Self {
            pubkeys,
            extra: Extra::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteRemoteKeyStatus {
    Deleted,
    NotFound,
    Error,
}

impl DeleteRemoteKeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deleted => "deleted",
            Self::NotFound => "not_found",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteRemoteKeysResponse {
    pub data: Vec<DeleteRemoteKeysResponseDataItem>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteRemoteKeysResponseDataItem {
    pub status: DeleteRemoteKeyStatus,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<Option<String>>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl DeleteRemoteKeysResponseDataItem {
    pub fn message(&self) -> Option<&str> {
        present(&self.message)
    }
}

// ---------------------------------------------------------------------------
// Gas limit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListGasLimitResponse {
    pub data: ListGasLimitResponseData,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListGasLimitResponseData {
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub pubkey: Option<Option<String>>,
    /// Decimal string, as the API transmits it.
    pub gas_limit: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ListGasLimitResponseData {
    /// `None` for a missing key and for an explicit `null`.
    pub fn pubkey(&self) -> Option<&str> {
        present(&self.pubkey)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetGasLimitRequest {
    pub gas_limit: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl SetGasLimitRequest {
    pub fn new(gas_limit: impl Into<String>) -> Self {
        Self {
            gas_limit: gas_limit.into(),
            extra: Extra::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Fee recipient
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListFeeRecipientResponse {
    pub data: ListFeeRecipientResponseData,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListFeeRecipientResponseData {
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub pubkey: Option<Option<String>>,
    pub ethaddress: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ListFeeRecipientResponseData {
    /// `None` for a missing key and for an explicit `null`.
    pub fn pubkey(&self) -> Option<&str> {
        present(&self.pubkey)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetFeeRecipientRequest {
    pub ethaddress: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl SetFeeRecipientRequest {
    pub fn new(ethaddress: impl Into<String>) -> Self {
        Self {
            ethaddress: ethaddress.into(),
            extra: Extra::new(),
        }
    }
}

macro_rules! impl_status_display {
    ($($status:ty),*) => {
        $(
            impl fmt::Display for $status {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

impl_status_display!(
    ImportKeystoreStatus,
    DeleteKeyStatus,
    ImportRemoteKeyStatus,
    DeleteRemoteKeyStatus
);
