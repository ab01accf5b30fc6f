//! Networked client for the Ethereum validator keymanager API.
//!
//! `keymanager-core` describes every call as an `Operation`; this crate
//! carries operations over HTTP. `UreqTransport` runs them on the calling
//! thread, `ReqwestTransport` inside an async runtime. `Eth2KeyManager` ties
//! a configuration to one transport of each kind and exposes every endpoint
//! as `name` and `name_async`.
//!
//! ```no_run
//! use keymanager_client::Eth2KeyManager;
//!
//! # fn main() -> keymanager_client::Result<()> {
//! let manager = Eth2KeyManager::builder()
//!     .base_url("http://localhost:7500")
//!     .token("api-token")
//!     .build()?;
//! let keys = manager.list_keys()?.into_parsed();
//! # let _ = keys;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod keymanager;
pub mod transport;

pub use error::{Error, Result};
pub use keymanager::{Eth2KeyManager, KeyManagerBuilder, BASE_URL_ENV, DEFAULT_TIMEOUT, TOKEN_ENV};
pub use transport::{AsyncTransport, ReqwestTransport, Transport, UreqTransport};
