//! Local keystore management: `/eth/v1/keystores`.

use crate::client::{KeyManagerClient, Operation};
use crate::error::ApiResult;
use crate::http::HttpMethod;
use crate::response::json_decoder;
use crate::types::{
    DeleteKeysRequest, DeleteKeysResponse, ImportKeystoresRequest, ImportKeystoresResponse,
    ListKeysResponse,
};

const ENDPOINT: &str = "keystores";

impl KeyManagerClient {
    /// `GET /eth/v1/keystores`: keys known to and decrypted by the keymanager.
    pub fn list_keys(&self) -> ApiResult<Operation<ListKeysResponse>> {
        self.operation::<_, ()>(ENDPOINT, HttpMethod::Get, None, Some(json_decoder()))
    }

    /// `POST /eth/v1/keystores`: import EIP-2335 keystores.
    ///
    /// The response holds one status per keystore in request order. Pairing
    /// of `passwords` with `keystores` is validated by the server only.
    pub fn import_keystores(
        &self,
        request: &ImportKeystoresRequest,
    ) -> ApiResult<Operation<ImportKeystoresResponse>> {
        self.operation(ENDPOINT, HttpMethod::Post, Some(request), Some(json_decoder()))
    }

    /// `DELETE /eth/v1/keystores`: delete keys and export their slashing
    /// protection data.
    ///
    /// Unknown keys are reported per key (`not_found`), never as a 404 for the
    /// whole batch.
    pub fn delete_keys(&self, pubkeys: &[String]) -> ApiResult<Operation<DeleteKeysResponse>> {
        let body = DeleteKeysRequest::new(pubkeys.to_vec());
        self.operation(ENDPOINT, HttpMethod::Delete, Some(&body), Some(json_decoder()))
    }
}
