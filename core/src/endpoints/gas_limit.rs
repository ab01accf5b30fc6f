//! Per-validator gas limit: `/eth/v1/validator/{pubkey}/gas_limit`.
//!
//! Servers without an external builder configured may answer any of these
//! with 400, which resolves to `Parsed::ApiError` like every other documented
//! error.

use crate::client::{KeyManagerClient, Operation};
use crate::error::ApiResult;
use crate::http::HttpMethod;
use crate::response::json_decoder;
use crate::types::{ListGasLimitResponse, SetGasLimitRequest};

fn endpoint(pubkey: &str) -> String {
    format!("validator/{pubkey}/gas_limit")
}

impl KeyManagerClient {
    /// `GET`: the configured gas limit, or the process-wide default.
    pub fn get_gas_limit(&self, pubkey: &str) -> ApiResult<Operation<ListGasLimitResponse>> {
        self.operation::<_, ()>(&endpoint(pubkey), HttpMethod::Get, None, Some(json_decoder()))
    }

    /// `POST`: answered with 202 and no body.
    pub fn set_gas_limit(&self, pubkey: &str, gas_limit: &str) -> ApiResult<Operation<()>> {
        let body = SetGasLimitRequest::new(gas_limit);
        self.operation(&endpoint(pubkey), HttpMethod::Post, Some(&body), None)
    }

    /// `DELETE`: answered with 204.
    pub fn delete_gas_limit(&self, pubkey: &str) -> ApiResult<Operation<()>> {
        self.operation::<_, ()>(&endpoint(pubkey), HttpMethod::Delete, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::fixtures::{client, response, ERROR_CASES, PUBKEY};
    use crate::error::ApiError;
    use crate::response::Parsed;

    #[test]
    fn set_gas_limit_accepted() {
        let op = client().set_gas_limit(PUBKEY, "999999").unwrap();
        let req = op.request();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(
            req.url,
            format!("http://localhost:8080/eth/v1/validator/{PUBKEY}/gas_limit")
        );
        assert_eq!(req.body.as_deref(), Some(r#"{"gas_limit":"999999"}"#));

        let resolved = op.resolve(response(202, "")).unwrap();
        assert_eq!(resolved.status, 202);
        assert_eq!(resolved.parsed, Parsed::Empty);
    }

    #[test]
    fn set_gas_limit_ok_has_no_model() {
        let op = client().set_gas_limit(PUBKEY, "999999").unwrap();
        let err = op.resolve(response(200, "{}")).unwrap_err();
        assert!(matches!(err, ApiError::ModelClassUnspecified { .. }));
    }

    #[test]
    fn get_gas_limit_decodes_data() {
        let op = client().get_gas_limit(PUBKEY).unwrap();
        assert_eq!(op.request().method, HttpMethod::Get);
        assert!(op.expects_body());

        let body = format!(r#"{{"data":{{"pubkey":"{PUBKEY}","gas_limit":"3456"}}}}"#);
        let parsed = op
            .resolve(response(200, &body))
            .unwrap()
            .into_parsed()
            .success()
            .unwrap();
        assert_eq!(parsed.data.gas_limit, "3456");
        assert_eq!(parsed.data.pubkey(), Some(PUBKEY));
    }

    #[test]
    fn delete_gas_limit_no_content() {
        let op = client().delete_gas_limit(PUBKEY).unwrap();
        assert_eq!(op.request().method, HttpMethod::Delete);
        assert!(op.request().body.is_none());
        let resolved = op.resolve(response(204, "")).unwrap();
        assert!(resolved.parsed.is_empty());
    }

    #[test]
    fn every_operation_surfaces_documented_errors() {
        let c = client();
        for (status, body) in ERROR_CASES {
            let get = c.get_gas_limit(PUBKEY).unwrap().resolve(response(status, body)).unwrap();
            let set = c
                .set_gas_limit(PUBKEY, "1")
                .unwrap()
                .resolve(response(status, body))
                .unwrap();
            let delete = c
                .delete_gas_limit(PUBKEY)
                .unwrap()
                .resolve(response(status, body))
                .unwrap();
            assert!(get.parsed.api_error().is_some(), "get {status}");
            assert!(set.parsed.api_error().is_some(), "set {status}");
            assert!(delete.parsed.api_error().is_some(), "delete {status}");
        }
    }
}
