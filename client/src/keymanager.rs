//! `Eth2KeyManager`: the high-level client.
//!
//! Every keymanager operation is available twice, as a blocking method and as
//! an `_async` method. Both come from the same `Operation` built by
//! `KeyManagerClient`; only the transport that carries it differs.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use keymanager_core::{
    ClientConfig, DeleteKeysResponse, DeleteRemoteKeysResponse, ImportKeystoresRequest,
    ImportKeystoresResponse, ImportRemoteKeysRequestItem, ImportRemoteKeysResponse,
    KeyManagerClient, ListFeeRecipientResponse, ListGasLimitResponse, ListKeysResponse,
    ListRemoteKeysResponse, Operation, Response, TlsVerification,
};
use tracing::debug;

use crate::error::{Error, Result};
use crate::transport::{AsyncTransport, ReqwestTransport, Transport, UreqTransport};

pub const BASE_URL_ENV: &str = "ETH_2_KEY_MANAGER_API_BASE_URL";
pub const TOKEN_ENV: &str = "ETH_2_KEY_MANAGER_API_TOKEN";

/// Request timeout used unless the builder overrides it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A variable set to the empty string counts as set.
fn from_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[derive(Debug, Clone)]
pub struct Eth2KeyManager<S = UreqTransport, A = ReqwestTransport> {
    client: KeyManagerClient,
    blocking: S,
    non_blocking: A,
}

impl Eth2KeyManager {
    /// Explicit values win over `ETH_2_KEY_MANAGER_API_BASE_URL` and
    /// `ETH_2_KEY_MANAGER_API_TOKEN`.
    pub fn new(base_url: Option<&str>, token: Option<&str>) -> Result<Self> {
        let mut builder = Self::builder();
        if let Some(base_url) = base_url {
            builder = builder.base_url(base_url);
        }
        if let Some(token) = token {
            builder = builder.token(token);
        }
        builder.build()
    }

    pub fn from_env() -> Result<Self> {
        Self::new(None, None)
    }

    pub fn builder() -> KeyManagerBuilder {
        KeyManagerBuilder::default()
    }
}

impl<S: Transport, A: AsyncTransport> Eth2KeyManager<S, A> {
    pub fn with_transports(config: ClientConfig, blocking: S, non_blocking: A) -> Self {
        Self {
            client: KeyManagerClient::new(config),
            blocking,
            non_blocking,
        }
    }

    pub fn client(&self) -> &KeyManagerClient {
        &self.client
    }

    pub fn config(&self) -> &ClientConfig {
        self.client.config()
    }

    /// The blocking and async transports, in that order.
    pub fn transports(&self) -> (&S, &A) {
        (&self.blocking, &self.non_blocking)
    }

    /// Carry `operation` over the blocking transport and resolve the reply.
    pub fn send<T>(&self, operation: Operation<T>) -> Result<Response<T>> {
        let response = self.blocking.execute(operation.request())?;
        debug!(status = response.status, "resolving blocking response");
        Ok(operation.resolve(response)?)
    }

    /// Carry `operation` over the async transport and resolve the reply.
    pub async fn send_async<T>(&self, operation: Operation<T>) -> Result<Response<T>> {
        let response = self.non_blocking.execute(operation.request()).await?;
        debug!(status = response.status, "resolving async response");
        Ok(operation.resolve(response)?)
    }
}

macro_rules! operations {
    ($(
        $(#[$meta:meta])*
        fn $name:ident / $async_name:ident ($($arg:ident: $ty:ty),*) -> $out:ty;
    )*) => {
        impl<S: Transport, A: AsyncTransport> Eth2KeyManager<S, A> {
            $(
                $(#[$meta])*
                pub fn $name(&self, $($arg: $ty),*) -> Result<Response<$out>> {
                    self.send(self.client.$name($($arg),*)?)
                }

                $(#[$meta])*
                pub async fn $async_name(&self, $($arg: $ty),*) -> Result<Response<$out>> {
                    self.send_async(self.client.$name($($arg),*)?).await
                }
            )*
        }
    };
}

operations! {
    /// List keys known to and decrypted by the keymanager.
    fn list_keys / list_keys_async() -> ListKeysResponse;
    /// Import EIP-2335 keystores, optionally with EIP-3076 slashing data.
    fn import_keystores / import_keystores_async(request: &ImportKeystoresRequest) -> ImportKeystoresResponse;
    /// Delete keys and export their slashing protection data.
    fn delete_keys / delete_keys_async(pubkeys: &[String]) -> DeleteKeysResponse;
    fn list_remote_keys / list_remote_keys_async() -> ListRemoteKeysResponse;
    fn import_remote_keys / import_remote_keys_async(remote_keys: &[ImportRemoteKeysRequestItem]) -> ImportRemoteKeysResponse;
    fn delete_remote_keys / delete_remote_keys_async(pubkeys: &[String]) -> DeleteRemoteKeysResponse;
    fn get_gas_limit / get_gas_limit_async(pubkey: &str) -> ListGasLimitResponse;
    /// Answered with 202 and no body.
    fn set_gas_limit / set_gas_limit_async(pubkey: &str, gas_limit: &str) -> ();
    fn delete_gas_limit / delete_gas_limit_async(pubkey: &str) -> ();
    fn list_fee_recipient / list_fee_recipient_async(pubkey: &str) -> ListFeeRecipientResponse;
    /// Answered with 202 and no body.
    fn set_fee_recipient / set_fee_recipient_async(pubkey: &str, ethaddress: &str) -> ();
    fn delete_fee_recipient / delete_fee_recipient_async(pubkey: &str) -> ();
}

/// Builder for `Eth2KeyManager`.
///
/// Unset base URL or token fall back to the environment at `build` time.
#[derive(Debug, Clone, Default)]
pub struct KeyManagerBuilder {
    base_url: Option<String>,
    token: Option<String>,
    headers: BTreeMap<String, String>,
    cookies: BTreeMap<String, String>,
    timeout: Option<Duration>,
    tls: Option<TlsVerification>,
    raise_on_unexpected_status: bool,
    follow_redirects: bool,
}

impl KeyManagerBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Defaults to `TlsVerification::Disabled`.
    pub fn tls(mut self, tls: TlsVerification) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn ca_bundle(self, path: impl Into<PathBuf>) -> Self {
        self.tls(TlsVerification::CaBundle(path.into()))
    }

    pub fn raise_on_unexpected_status(mut self, raise: bool) -> Self {
        self.raise_on_unexpected_status = raise;
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Resolve the environment fallback and produce a validated configuration.
    pub fn build_config(&self) -> Result<ClientConfig> {
        let base_url = self.base_url.clone().or_else(|| from_env(BASE_URL_ENV));
        let token = self.token.clone().or_else(|| from_env(TOKEN_ENV));
        let (Some(base_url), Some(token)) = (base_url, token) else {
            return Err(Error::ConfigurationMissing);
        };

        let config = ClientConfig::authenticated(base_url, token)
            .with_headers(self.headers.clone())
            .with_cookies(self.cookies.clone())
            .with_timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .with_tls(self.tls.clone().unwrap_or(TlsVerification::Disabled))
            .with_raise_on_unexpected_status(self.raise_on_unexpected_status)
            .with_follow_redirects(self.follow_redirects);
        config.validate()?;
        Ok(config)
    }

    pub fn build(self) -> Result<Eth2KeyManager> {
        let config = self.build_config()?;
        let blocking = UreqTransport::new(config.tls.clone());
        let non_blocking = ReqwestTransport::new(config.tls.clone());
        Ok(Eth2KeyManager::with_transports(config, blocking, non_blocking))
    }

    /// Build with caller-supplied transports.
    pub fn build_with<S: Transport, A: AsyncTransport>(
        self,
        blocking: S,
        non_blocking: A,
    ) -> Result<Eth2KeyManager<S, A>> {
        let config = self.build_config()?;
        Ok(Eth2KeyManager::with_transports(config, blocking, non_blocking))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> KeyManagerBuilder {
        Eth2KeyManager::builder()
            .base_url("https://validator.example:7500")
            .token("api-token")
    }

    #[test]
    fn facade_defaults() {
        let config = builder().build_config().unwrap();
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.tls, TlsVerification::Disabled);
        assert!(!config.raise_on_unexpected_status);
        assert!(!config.follow_redirects);
        assert_eq!(config.get_headers()["Authorization"], "Bearer api-token");
    }

    #[test]
    fn builder_options_reach_config() {
        let config = builder()
            .header("X-Trace", "1")
            .cookie("session", "abc")
            .timeout(Duration::from_secs(3))
            .ca_bundle("/etc/ssl/keymanager.pem")
            .raise_on_unexpected_status(true)
            .follow_redirects(true)
            .build_config()
            .unwrap();
        assert_eq!(config.get_headers()["X-Trace"], "1");
        assert_eq!(config.get_cookies()["session"], "abc");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(
            config.tls,
            TlsVerification::CaBundle(PathBuf::from("/etc/ssl/keymanager.pem"))
        );
        assert!(config.raise_on_unexpected_status);
        assert!(config.follow_redirects);
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let err = Eth2KeyManager::builder()
            .base_url("validator:7500")
            .token("t")
            .build_config()
            .unwrap_err();
        assert!(matches!(err, Error::Api(keymanager_core::ApiError::Config(_))));
    }

    #[test]
    fn blocking_and_async_share_one_request() {
        let manager = builder().build().unwrap();
        let op = manager.client().set_gas_limit("0xabc", "999999").unwrap();
        assert_eq!(
            op.request().url,
            "https://validator.example:7500/eth/v1/validator/0xabc/gas_limit"
        );
        assert_eq!(manager.config().base_url, "https://validator.example:7500");
    }
}
