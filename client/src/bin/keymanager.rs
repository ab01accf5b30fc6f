//! `keymanager` - command-line access to a validator client's keymanager API.
//!
//! Prints the status code and the parsed reply of a single call as JSON.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use keymanager_client::{Eth2KeyManager, BASE_URL_ENV, TOKEN_ENV};
use keymanager_core::{
    ImportKeystoresRequest, ImportRemoteKeysRequestItem, Operation, Parsed, Response,
    TlsVerification,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "keymanager")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Keymanager base URL, e.g. http://localhost:7500
    #[arg(long, global = true, env = BASE_URL_ENV)]
    base_url: Option<String>,

    /// Bearer token
    #[arg(long, global = true, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value = "10")]
    timeout: u64,

    /// Verify the server certificate against the system roots
    #[arg(long, global = true)]
    verify_tls: bool,

    /// Verify the server certificate against this PEM bundle
    #[arg(long, global = true, value_name = "PEM")]
    ca_bundle: Option<PathBuf>,

    /// Fail on status codes the API does not document
    #[arg(long, global = true)]
    raise_on_unexpected_status: bool,

    /// Follow HTTP redirects
    #[arg(long, global = true)]
    follow_redirects: bool,

    /// Use the async transport
    #[arg(long = "async", global = true)]
    use_async: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List local keystores
    ListKeys,

    /// Import EIP-2335 keystores
    ImportKeystores {
        /// Keystore file; repeat for several
        #[arg(long = "keystore", required = true)]
        keystores: Vec<PathBuf>,

        /// Password for the keystore at the same position
        #[arg(long = "password")]
        passwords: Vec<String>,

        /// EIP-3076 interchange file
        #[arg(long)]
        slashing_protection: Option<PathBuf>,
    },

    /// Delete local keys and export their slashing protection data
    DeleteKeys {
        #[arg(required = true)]
        pubkeys: Vec<String>,
    },

    /// List remote signer keys
    ListRemoteKeys,

    /// Register keys held by a remote signer
    ImportRemoteKeys {
        /// Remote signer URL applied to every key
        #[arg(long)]
        url: Option<String>,

        #[arg(required = true)]
        pubkeys: Vec<String>,
    },

    /// Remove remote signer keys
    DeleteRemoteKeys {
        #[arg(required = true)]
        pubkeys: Vec<String>,
    },

    /// Show a validator's gas limit
    GetGasLimit { pubkey: String },

    /// Set a validator's gas limit
    SetGasLimit { pubkey: String, gas_limit: String },

    /// Reset a validator's gas limit to the default
    DeleteGasLimit { pubkey: String },

    /// Show a validator's fee recipient
    ListFeeRecipient { pubkey: String },

    /// Set a validator's fee recipient
    SetFeeRecipient { pubkey: String, ethaddress: String },

    /// Reset a validator's fee recipient to the default
    DeleteFeeRecipient { pubkey: String },
}

fn manager(cli: &Cli) -> keymanager_client::Result<Eth2KeyManager> {
    let mut builder = Eth2KeyManager::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .raise_on_unexpected_status(cli.raise_on_unexpected_status)
        .follow_redirects(cli.follow_redirects);
    if let Some(base_url) = &cli.base_url {
        builder = builder.base_url(base_url);
    }
    if let Some(token) = &cli.token {
        builder = builder.token(token);
    }
    builder = match (&cli.ca_bundle, cli.verify_tls) {
        (Some(path), _) => builder.ca_bundle(path),
        (None, true) => builder.tls(TlsVerification::Enabled),
        (None, false) => builder.tls(TlsVerification::Disabled),
    };
    builder.build()
}

fn report<T: Serialize>(response: Response<T>) -> Value {
    let parsed = match response.parsed {
        Parsed::Success(value) => json!({ "success": value }),
        Parsed::ApiError(error) => json!({ "error": error }),
        Parsed::Empty => Value::Null,
        Parsed::Unresolved => {
            json!({ "unresolved": String::from_utf8_lossy(&response.content) })
        }
    };
    json!({ "status": response.status, "parsed": parsed })
}

fn execute<T: Serialize>(
    manager: &Eth2KeyManager,
    operation: Operation<T>,
    runtime: Option<&Runtime>,
) -> CliResult<Value> {
    let response = match runtime {
        Some(runtime) => runtime.block_on(manager.send_async(operation))?,
        None => manager.send(operation)?,
    };
    Ok(report(response))
}

fn dispatch(manager: &Eth2KeyManager, command: &Command, runtime: Option<&Runtime>) -> CliResult<Value> {
    let client = manager.client();
    match command {
        Command::ListKeys => execute(manager, client.list_keys()?, runtime),
        Command::ImportKeystores {
            keystores,
            passwords,
            slashing_protection,
        } => {
            let keystores = keystores
                .iter()
                .map(std::fs::read_to_string)
                .collect::<Result<Vec<_>, _>>()?;
            let slashing_protection = slashing_protection
                .as_ref()
                .map(std::fs::read_to_string)
                .transpose()?;
            let request = ImportKeystoresRequest::new(keystores, passwords.clone(), slashing_protection);
            execute(manager, client.import_keystores(&request)?, runtime)
        }
        Command::DeleteKeys { pubkeys } => execute(manager, client.delete_keys(pubkeys)?, runtime),
        Command::ListRemoteKeys => execute(manager, client.list_remote_keys()?, runtime),
        Command::ImportRemoteKeys { url, pubkeys } => {
            let keys: Vec<_> = pubkeys
                .iter()
                .map(|pubkey| ImportRemoteKeysRequestItem::new(pubkey.as_str(), url.clone()))
                .collect();
            execute(manager, client.import_remote_keys(&keys)?, runtime)
        }
        Command::DeleteRemoteKeys { pubkeys } => {
            execute(manager, client.delete_remote_keys(pubkeys)?, runtime)
        }
        Command::GetGasLimit { pubkey } => execute(manager, client.get_gas_limit(pubkey)?, runtime),
        Command::SetGasLimit { pubkey, gas_limit } => {
            execute(manager, client.set_gas_limit(pubkey, gas_limit)?, runtime)
        }
        Command::DeleteGasLimit { pubkey } => {
            execute(manager, client.delete_gas_limit(pubkey)?, runtime)
        }
        Command::ListFeeRecipient { pubkey } => {
            execute(manager, client.list_fee_recipient(pubkey)?, runtime)
        }
        Command::SetFeeRecipient { pubkey, ethaddress } => {
            execute(manager, client.set_fee_recipient(pubkey, ethaddress)?, runtime)
        }
        Command::DeleteFeeRecipient { pubkey } => {
            execute(manager, client.delete_fee_recipient(pubkey)?, runtime)
        }
    }
}

fn run(cli: &Cli) -> CliResult<Value> {
    let manager = manager(cli)?;
    let runtime = if cli.use_async {
        Some(
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?,
        )
    } else {
        None
    };
    dispatch(&manager, &cli.command, runtime.as_ref())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(report) => {
            println!("{report:#}");
            let status = report["status"].as_u64().unwrap_or_default();
            if (200..300).contains(&status) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
