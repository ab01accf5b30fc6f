//! In-memory implementation of the keymanager API for tests and local use.
//!
//! Keystores are never decrypted: the server reads the `pubkey` and `path`
//! fields of each EIP-2335 keystore and trusts the supplied passwords. DTOs
//! are defined here independently of `keymanager-core`; the client
//! integration tests catch schema drift between the two.

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

pub const DEFAULT_TOKEN: &str = "api-token";
pub const DEFAULT_FEE_RECIPIENT: &str = "0xabcf8e0d4e9587369b2301d0790347320302cc09";
pub const DEFAULT_GAS_LIMIT: &str = "30000000";
pub const GENESIS_VALIDATORS_ROOT: &str =
    "0xcf8e0d4e9587369b2301d0790347320302cc0943d5a1884560367e8208d920f2";
const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Expected bearer token.
    pub token: String,
    /// Without an external builder the gas-limit routes answer 400.
    pub builder_enabled: bool,
    pub default_fee_recipient: String,
    pub default_gas_limit: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            token: DEFAULT_TOKEN.to_string(),
            builder_enabled: true,
            default_fee_recipient: DEFAULT_FEE_RECIPIENT.to_string(),
            default_gas_limit: DEFAULT_GAS_LIMIT.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    pub stacktraces: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Keystore {
    pub validating_pubkey: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derivation_path: Option<String>,
    pub readonly: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteKey {
    pub pubkey: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub readonly: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Status {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Status {
    fn ok(status: &str) -> Self {
        Self {
            status: status.to_string(),
            message: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Data<T> {
    pub data: T,
}

#[derive(Deserialize)]
pub struct ImportKeystores {
    pub keystores: Vec<String>,
    pub passwords: Vec<String>,
    pub slashing_protection: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteKeysResult {
    pub data: Vec<Status>,
    pub slashing_protection: String,
}

#[derive(Deserialize)]
pub struct Pubkeys {
    pub pubkeys: Vec<String>,
}

#[derive(Deserialize)]
pub struct ImportRemoteKeys {
    pub remote_keys: Vec<ImportRemoteKey>,
}

#[derive(Deserialize)]
pub struct ImportRemoteKey {
    pub pubkey: String,
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeeRecipient {
    pub pubkey: String,
    pub ethaddress: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GasLimit {
    pub pubkey: String,
    pub gas_limit: String,
}

#[derive(Deserialize)]
pub struct SetFeeRecipient {
    pub ethaddress: String,
}

#[derive(Deserialize)]
pub struct SetGasLimit {
    pub gas_limit: String,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Default, Debug)]
pub struct Store {
    pub keystores: Vec<Keystore>,
    pub remote_keys: Vec<RemoteKey>,
    /// Pubkeys with slashing protection history, kept after deletion.
    pub slashing_history: BTreeSet<String>,
    pub fee_recipients: HashMap<String, String>,
    pub gas_limits: HashMap<String, String>,
}

impl Store {
    fn is_known(&self, pubkey: &str) -> bool {
        self.keystores.iter().any(|k| k.validating_pubkey == pubkey)
            || self.remote_keys.iter().any(|k| k.pubkey == pubkey)
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub db: Db,
}

/// Error reply carrying the keymanager `{code, message, stacktraces}` body.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    message: String,
}

impl ApiFailure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn unknown_validator(pubkey: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("NOT_FOUND: no validator found with pubkey {pubkey}"),
        )
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.status.as_u16(),
            message: self.message,
            stacktraces: Vec::new(),
        };
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn app() -> Router {
    app_with_config(ServerConfig::default())
}

pub fn app_with_config(config: ServerConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
        db: Arc::new(RwLock::new(Store::default())),
    };
    Router::new()
        .route(
            "/eth/v1/keystores",
            get(list_keystores).post(import_keystores).delete(delete_keystores),
        )
        .route(
            "/eth/v1/remotekeys",
            get(list_remote_keys).post(import_remote_keys).delete(delete_remote_keys),
        )
        .route(
            "/eth/v1/validator/{pubkey}/feerecipient",
            get(get_fee_recipient).post(set_fee_recipient).delete(delete_fee_recipient),
        )
        .route(
            "/eth/v1/validator/{pubkey}/gas_limit",
            get(get_gas_limit).post(set_gas_limit).delete(delete_gas_limit),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_config(listener, ServerConfig::default()).await
}

pub async fn run_with_config(
    listener: TcpListener,
    config: ServerConfig,
) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "keymanager mock listening");
    }
    axum::serve(listener, app_with_config(config)).await
}

async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiFailure> {
    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match provided {
        None => Err(ApiFailure::new(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED: missing Authorization header",
        )),
        Some(value) if value != format!("Bearer {}", state.config.token) => Err(ApiFailure::new(
            StatusCode::FORBIDDEN,
            format!("FORBIDDEN: Invalid auth token: {value}"),
        )),
        Some(_) => Ok(next.run(request).await),
    }
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiFailure> {
    serde_json::from_slice(body)
        .map_err(|e| ApiFailure::bad_request(format!("BAD_REQUEST: invalid request body: {e}")))
}

/// Lowercase and `0x`-prefix a hex pubkey as it appears in a keystore.
fn normalize_pubkey(pubkey: &str) -> String {
    let lower = pubkey.to_lowercase();
    if lower.starts_with("0x") {
        lower
    } else {
        format!("0x{lower}")
    }
}

fn interchange(pubkeys: &[String]) -> String {
    let data: Vec<serde_json::Value> = pubkeys
        .iter()
        .map(|pubkey| {
            serde_json::json!({
                "pubkey": pubkey,
                "signed_blocks": [],
                "signed_attestations": []
            })
        })
        .collect();
    serde_json::json!({
        "metadata": {
            "interchange_format_version": "5",
            "genesis_validators_root": GENESIS_VALIDATORS_ROOT
        },
        "data": data
    })
    .to_string()
}

fn is_eth_address(address: &str) -> bool {
    address.len() == 42
        && address.starts_with("0x")
        && address[2..].chars().all(|c| c.is_ascii_hexdigit())
}

// ---------------------------------------------------------------------------
// Local keystores
// ---------------------------------------------------------------------------

async fn list_keystores(State(state): State<AppState>) -> Json<Data<Vec<Keystore>>> {
    let store = state.db.read().await;
    Json(Data {
        data: store.keystores.clone(),
    })
}

async fn import_keystores(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Data<Vec<Status>>>, ApiFailure> {
    let input: ImportKeystores = parse_body(&body)?;
    if input.keystores.len() != input.passwords.len() {
        return Err(ApiFailure::bad_request(format!(
            "BAD_REQUEST: {} keystores but {} passwords",
            input.keystores.len(),
            input.passwords.len()
        )));
    }
    if let Some(slashing) = &input.slashing_protection {
        serde_json::from_str::<serde_json::Value>(slashing).map_err(|e| {
            ApiFailure::bad_request(format!("BAD_REQUEST: invalid slashing protection data: {e}"))
        })?;
    }

    let mut store = state.db.write().await;
    let mut statuses = Vec::with_capacity(input.keystores.len());
    for raw in &input.keystores {
        let keystore: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                statuses.push(Status::error(format!("invalid keystore: {e}")));
                continue;
            }
        };
        let Some(pubkey) = keystore.get("pubkey").and_then(|v| v.as_str()) else {
            statuses.push(Status::error("keystore has no pubkey"));
            continue;
        };
        let pubkey = normalize_pubkey(pubkey);
        if store.is_known(&pubkey) {
            statuses.push(Status::ok("duplicate"));
            continue;
        }
        let derivation_path = keystore
            .get("path")
            .and_then(|v| v.as_str())
            .filter(|path| !path.is_empty())
            .map(str::to_string);
        store.slashing_history.insert(pubkey.clone());
        store.keystores.push(Keystore {
            validating_pubkey: pubkey,
            derivation_path,
            readonly: false,
        });
        statuses.push(Status::ok("imported"));
    }
    debug!(count = statuses.len(), "imported keystores");
    Ok(Json(Data { data: statuses }))
}

async fn delete_keystores(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DeleteKeysResult>, ApiFailure> {
    let input: Pubkeys = parse_body(&body)?;
    let mut store = state.db.write().await;
    let mut statuses = Vec::with_capacity(input.pubkeys.len());
    let mut exported = Vec::new();

    for raw in &input.pubkeys {
        let pubkey = normalize_pubkey(raw);
        if let Some(index) = store
            .keystores
            .iter()
            .position(|k| k.validating_pubkey == pubkey)
        {
            if store.keystores[index].readonly {
                statuses.push(Status::error("key is read-only"));
                continue;
            }
            store.keystores.remove(index);
            exported.push(pubkey);
            statuses.push(Status::ok("deleted"));
        } else if store.slashing_history.contains(&pubkey) {
            exported.push(pubkey);
            statuses.push(Status::ok("not_active"));
        } else {
            statuses.push(Status::ok("not_found"));
        }
    }

    Ok(Json(DeleteKeysResult {
        data: statuses,
        slashing_protection: interchange(&exported),
    }))
}

// ---------------------------------------------------------------------------
// Remote keys
// ---------------------------------------------------------------------------

async fn list_remote_keys(State(state): State<AppState>) -> Json<Data<Vec<RemoteKey>>> {
    let store = state.db.read().await;
    Json(Data {
        data: store.remote_keys.clone(),
    })
}

async fn import_remote_keys(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Data<Vec<Status>>>, ApiFailure> {
    let input: ImportRemoteKeys = parse_body(&body)?;
    let mut store = state.db.write().await;
    let statuses = input
        .remote_keys
        .into_iter()
        .map(|key| {
            let pubkey = normalize_pubkey(&key.pubkey);
            if store.is_known(&pubkey) {
                return Status::ok("duplicate");
            }
            store.remote_keys.push(RemoteKey {
                pubkey,
                url: key.url,
                readonly: false,
            });
            Status::ok("imported")
        })
        .collect();
    Ok(Json(Data { data: statuses }))
}

async fn delete_remote_keys(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Data<Vec<Status>>>, ApiFailure> {
    let input: Pubkeys = parse_body(&body)?;
    let mut store = state.db.write().await;
    let statuses = input
        .pubkeys
        .iter()
        .map(|raw| {
            let pubkey = normalize_pubkey(raw);
            match store.remote_keys.iter().position(|k| k.pubkey == pubkey) {
                Some(index) => {
                    store.remote_keys.remove(index);
                    Status::ok("deleted")
                }
                None => Status::ok("not_found"),
            }
        })
        .collect();
    Ok(Json(Data { data: statuses }))
}

// ---------------------------------------------------------------------------
// Fee recipient
// ---------------------------------------------------------------------------

async fn get_fee_recipient(
    State(state): State<AppState>,
    Path(pubkey): Path<String>,
) -> Result<Json<Data<FeeRecipient>>, ApiFailure> {
    let pubkey = normalize_pubkey(&pubkey);
    let store = state.db.read().await;
    if !store.is_known(&pubkey) {
        return Err(ApiFailure::unknown_validator(&pubkey));
    }
    let ethaddress = store
        .fee_recipients
        .get(&pubkey)
        .cloned()
        .unwrap_or_else(|| state.config.default_fee_recipient.clone());
    Ok(Json(Data {
        data: FeeRecipient { pubkey, ethaddress },
    }))
}

async fn set_fee_recipient(
    State(state): State<AppState>,
    Path(pubkey): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiFailure> {
    let pubkey = normalize_pubkey(&pubkey);
    let input: SetFeeRecipient = parse_body(&body)?;
    if !is_eth_address(&input.ethaddress) {
        return Err(ApiFailure::bad_request(format!(
            "BAD_REQUEST: invalid ethaddress {}",
            input.ethaddress
        )));
    }
    if input.ethaddress == ZERO_ADDRESS {
        return Err(ApiFailure::bad_request(
            "BAD_REQUEST: fee recipient cannot be the zero address",
        ));
    }
    let mut store = state.db.write().await;
    if !store.is_known(&pubkey) {
        return Err(ApiFailure::unknown_validator(&pubkey));
    }
    store
        .fee_recipients
        .insert(pubkey, input.ethaddress.to_lowercase());
    Ok(StatusCode::ACCEPTED)
}

async fn delete_fee_recipient(
    State(state): State<AppState>,
    Path(pubkey): Path<String>,
) -> Result<StatusCode, ApiFailure> {
    let pubkey = normalize_pubkey(&pubkey);
    let mut store = state.db.write().await;
    if !store.is_known(&pubkey) {
        return Err(ApiFailure::unknown_validator(&pubkey));
    }
    store.fee_recipients.remove(&pubkey);
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Gas limit
// ---------------------------------------------------------------------------

fn require_builder(config: &ServerConfig) -> Result<(), ApiFailure> {
    if config.builder_enabled {
        Ok(())
    } else {
        Err(ApiFailure::bad_request(
            "BAD_REQUEST: no external builder is configured",
        ))
    }
}

async fn get_gas_limit(
    State(state): State<AppState>,
    Path(pubkey): Path<String>,
) -> Result<Json<Data<GasLimit>>, ApiFailure> {
    require_builder(&state.config)?;
    let pubkey = normalize_pubkey(&pubkey);
    let store = state.db.read().await;
    if !store.is_known(&pubkey) {
        return Err(ApiFailure::unknown_validator(&pubkey));
    }
    let gas_limit = store
        .gas_limits
        .get(&pubkey)
        .cloned()
        .unwrap_or_else(|| state.config.default_gas_limit.clone());
    Ok(Json(Data {
        data: GasLimit { pubkey, gas_limit },
    }))
}

async fn set_gas_limit(
    State(state): State<AppState>,
    Path(pubkey): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiFailure> {
    require_builder(&state.config)?;
    let pubkey = normalize_pubkey(&pubkey);
    let input: SetGasLimit = parse_body(&body)?;
    let gas_limit: u64 = input.gas_limit.parse().map_err(|_| {
        ApiFailure::bad_request(format!("BAD_REQUEST: invalid gas_limit {}", input.gas_limit))
    })?;
    let mut store = state.db.write().await;
    if !store.is_known(&pubkey) {
        return Err(ApiFailure::unknown_validator(&pubkey));
    }
    store.gas_limits.insert(pubkey, gas_limit.to_string());
    Ok(StatusCode::ACCEPTED)
}

async fn delete_gas_limit(
    State(state): State<AppState>,
    Path(pubkey): Path<String>,
) -> Result<StatusCode, ApiFailure> {
    require_builder(&state.config)?;
    let pubkey = normalize_pubkey(&pubkey);
    let mut store = state.db.write().await;
    if !store.is_known(&pubkey) {
        return Err(ApiFailure::unknown_validator(&pubkey));
    }
    store.gas_limits.remove(&pubkey);
    Ok(StatusCode::NO_CONTENT)
}
