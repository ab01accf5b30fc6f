//! Remote signer key management: `/eth/v1/remotekeys`.

use crate::client::{KeyManagerClient, Operation};
use crate::error::ApiResult;
use crate::http::HttpMethod;
use crate::response::json_decoder;
use crate::types::{
    DeleteRemoteKeysRequest, DeleteRemoteKeysResponse, ImportRemoteKeysRequest,
    ImportRemoteKeysRequestItem, ImportRemoteKeysResponse, ListRemoteKeysResponse,
};

const ENDPOINT: &str = "remotekeys";

impl KeyManagerClient {
    /// `GET /eth/v1/remotekeys`
    pub fn list_remote_keys(&self) -> ApiResult<Operation<ListRemoteKeysResponse>> {
        self.operation::<_, ()>(ENDPOINT, HttpMethod::Get, None, Some(json_decoder()))
    }

    /// `POST /eth/v1/remotekeys`: register keys whose signing is delegated to
    /// a remote signer.
    pub fn import_remote_keys(
        &self,
        remote_keys: &[ImportRemoteKeysRequestItem],
    ) -> ApiResult<Operation<ImportRemoteKeysResponse>> {
        let body = ImportRemoteKeysRequest::new(remote_keys.to_vec());
        self.operation(ENDPOINT, HttpMethod::Post, Some(&body), Some(json_decoder()))
    }

    /// `DELETE /eth/v1/remotekeys`
    pub fn delete_remote_keys(
        &self,
        pubkeys: &[String],
    ) -> ApiResult<Operation<DeleteRemoteKeysResponse>> {
        let body = DeleteRemoteKeysRequest::new(pubkeys.to_vec());
        self.operation(ENDPOINT, HttpMethod::Delete, Some(&body), Some(json_decoder()))
    }
}
