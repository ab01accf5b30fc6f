//! Facade behaviour for every status class, driven by canned transports.

use std::sync::Mutex;

use keymanager_client::{
    AsyncTransport, Error, Eth2KeyManager, Transport, BASE_URL_ENV, TOKEN_ENV,
};
use keymanager_core::{ApiError, HttpRequest, HttpResponse, Parsed};

const PUBKEY: &str = "0x93247f2209abcacf57b75a51dafae777f9dd38bc7053d1af526f220a7489a6d3a2753e5f3e8b1cfe39b56f43611df74a";

/// Serializes tests that touch process environment variables.
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Answers every request with the same response and remembers the last request.
struct Canned {
    status: u16,
    body: String,
    seen: Mutex<Option<HttpRequest>>,
}

impl Canned {
    fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            seen: Mutex::new(None),
        }
    }

    fn respond(&self, request: &HttpRequest) -> HttpResponse {
        *self.seen.lock().unwrap() = Some(request.clone());
        HttpResponse::new(self.status, self.body.as_bytes().to_vec())
    }
}

impl Transport for Canned {
    fn execute(&self, request: &HttpRequest) -> keymanager_client::Result<HttpResponse> {
        Ok(self.respond(request))
    }
}

impl AsyncTransport for Canned {
    async fn execute(&self, request: &HttpRequest) -> keymanager_client::Result<HttpResponse> {
        Ok(self.respond(request))
    }
}

fn manager(status: u16, body: &str, raise: bool) -> Eth2KeyManager<Canned, Canned> {
    Eth2KeyManager::builder()
        .base_url("http://localhost:7500")
        .token("api-token")
        .raise_on_unexpected_status(raise)
        .build_with(Canned::new(status, body), Canned::new(status, body))
        .unwrap()
}

fn error_body(code: u16, message: &str) -> String {
    serde_json::json!({"code": code, "message": message}).to_string()
}

#[test]
fn set_gas_limit_accepted_is_empty() {
    let m = manager(202, "", false);
    let response = m.set_gas_limit(PUBKEY, "999999").unwrap();
    assert_eq!(response.status, 202);
    assert_eq!(response.parsed, Parsed::Empty);

    let seen = m.transports().0.seen.lock().unwrap().clone().unwrap();
    assert_eq!(seen.body.as_deref(), Some(r#"{"gas_limit":"999999"}"#));
    assert_eq!(seen.headers["Authorization"], "Bearer api-token");
}

#[test]
fn get_gas_limit_decodes_success() {
    let m = manager(200, r#"{"data":{"gas_limit":"3456"}}"#, false);
    let gas = m.get_gas_limit(PUBKEY).unwrap().into_parsed().success().unwrap();
    assert_eq!(gas.data.gas_limit, "3456");
    assert_eq!(gas.data.pubkey(), None);
}

#[tokio::test]
async fn async_get_gas_limit_decodes_success() {
    let m = manager(200, r#"{"data":{"pubkey":"0x1","gas_limit":"3456"}}"#, false);
    let gas = m
        .get_gas_limit_async(PUBKEY)
        .await
        .unwrap()
        .into_parsed()
        .success()
        .unwrap();
    assert_eq!(gas.data.gas_limit, "3456");
}

#[test]
fn ok_without_model_is_error() {
    let m = manager(200, "{}", false);
    let err = m.delete_fee_recipient(PUBKEY).unwrap_err();
    assert!(matches!(
        err,
        Error::Api(ApiError::ModelClassUnspecified { status: 200, .. })
    ));
}

#[test]
fn no_content_is_empty() {
    let m = manager(204, "", false);
    assert!(m.delete_gas_limit(PUBKEY).unwrap().parsed.is_empty());
}

#[test]
fn documented_errors_resolve_to_error_model() {
    for status in [400u16, 401, 403, 404, 500] {
        let message = format!("failure {status}");
        let m = manager(status, &error_body(status, &message), true);
        let response = m.list_keys().unwrap();
        assert_eq!(response.status, status);
        let error = response.parsed.api_error().unwrap();
        assert_eq!(error.code, i64::from(status));
        assert_eq!(error.message, message);
    }
}

#[test]
fn unauthorized_message_is_kept() {
    let m = manager(401, r#"{"code":401,"message":"UNAUTHORIZED: missing Authorization header"}"#, false);
    let response = m.list_remote_keys().unwrap();
    assert_eq!(
        response.parsed.api_error().unwrap().message,
        "UNAUTHORIZED: missing Authorization header"
    );
}

#[test]
fn undocumented_status_passes_through() {
    let m = manager(407, "proxy authentication required", false);
    let response = m.list_keys().unwrap();
    assert_eq!(response.status, 407);
    assert_eq!(response.parsed, Parsed::Unresolved);
    assert_eq!(response.content, b"proxy authentication required");
}

#[tokio::test]
async fn undocumented_status_raises_when_configured() {
    let m = manager(407, "proxy authentication required", true);
    let err = m.list_keys_async().await.unwrap_err();
    match err {
        Error::Api(ApiError::UnexpectedStatus { status, content }) => {
            assert_eq!(status, 407);
            assert_eq!(content, b"proxy authentication required");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_error_body_is_deserialization_error() {
    let m = manager(500, "<html>oops</html>", false);
    let err = m.list_keys().unwrap_err();
    assert!(matches!(err, Error::Api(ApiError::Deserialization(_))));
}

#[test]
fn missing_configuration_names_variables() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    std::env::remove_var(BASE_URL_ENV);
    std::env::remove_var(TOKEN_ENV);

    let err = Eth2KeyManager::from_env().unwrap_err();
    assert!(matches!(err, Error::ConfigurationMissing));
    let message = err.to_string();
    assert!(message.contains(BASE_URL_ENV));
    assert!(message.contains(TOKEN_ENV));

    let err = Eth2KeyManager::new(Some("http://localhost:7500"), None).unwrap_err();
    assert!(matches!(err, Error::ConfigurationMissing));
}

#[test]
fn environment_supplies_configuration() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    std::env::set_var(BASE_URL_ENV, "http://env-host:7500");
    std::env::set_var(TOKEN_ENV, "env-token");

    let from_env = Eth2KeyManager::from_env().unwrap();
    assert_eq!(from_env.config().base_url, "http://env-host:7500");
    assert_eq!(from_env.config().token.as_deref(), Some("env-token"));

    let explicit = Eth2KeyManager::new(Some("http://explicit:7500"), None).unwrap();
    assert_eq!(explicit.config().base_url, "http://explicit:7500");
    assert_eq!(explicit.config().token.as_deref(), Some("env-token"));

    std::env::remove_var(BASE_URL_ENV);
    std::env::remove_var(TOKEN_ENV);
}

#[test]
fn empty_environment_values_count_as_set() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    std::env::set_var(BASE_URL_ENV, "http://env-host:7500");
    std::env::set_var(TOKEN_ENV, "");

    let manager = Eth2KeyManager::from_env().unwrap();
    assert_eq!(manager.config().token.as_deref(), Some(""));
    assert_eq!(manager.config().get_headers()["Authorization"], "Bearer ");

    std::env::set_var(BASE_URL_ENV, "");
    let err = Eth2KeyManager::from_env().unwrap_err();
    assert!(matches!(err, Error::Api(ApiError::Config(_))));

    std::env::remove_var(BASE_URL_ENV);
    std::env::remove_var(TOKEN_ENV);
}
