//! Per-validator fee recipient: `/eth/v1/validator/{pubkey}/feerecipient`.

use crate::client::{KeyManagerClient, Operation};
use crate::error::ApiResult;
use crate::http::HttpMethod;
use crate::response::json_decoder;
use crate::types::{ListFeeRecipientResponse, SetFeeRecipientRequest};

fn endpoint(pubkey: &str) -> String {
    format!("validator/{pubkey}/feerecipient")
}

impl KeyManagerClient {
    /// `GET`: the configured execution address, or the process-wide default.
    pub fn list_fee_recipient(
        &self,
        pubkey: &str,
    ) -> ApiResult<Operation<ListFeeRecipientResponse>> {
        self.operation::<_, ()>(&endpoint(pubkey), HttpMethod::Get, None, Some(json_decoder()))
    }

    /// `POST`: answered with 202. The zero address is rejected server-side.
    pub fn set_fee_recipient(&self, pubkey: &str, ethaddress: &str) -> ApiResult<Operation<()>> {
        let body = SetFeeRecipientRequest::new(ethaddress);
        self.operation(&endpoint(pubkey), HttpMethod::Post, Some(&body), None)
    }

    /// `DELETE`: answered with 204.
    pub fn delete_fee_recipient(&self, pubkey: &str) -> ApiResult<Operation<()>> {
        self.operation::<_, ()>(&endpoint(pubkey), HttpMethod::Delete, None, None)
    }
}
