//! REST client implementation of the node API

use async_trait::async_trait;
use serde::Deserialize;

use super::{AccountRecord, NodeApi, Session, SignedTransaction, TransactionRecord, TransactionRequest};
use crate::error::{RegistrarError, RegistrarResult};

/// Node client speaking the REST API at a single base URL
///
/// Holds no connection state of its own; every call goes through the
/// session it is handed, so one client serves all proxies.
pub struct NodeClient {
    base_url: String,
}

#[derive(Deserialize)]
struct SubmitResponse {
    hash: String,
}

impl NodeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Map any status >= 400 to an API error carrying the body
    async fn check(response: reqwest::Response) -> RegistrarResult<reqwest::Response> {
        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistrarError::Api { status, body });
        }
        Ok(response)
    }
}

#[async_trait]
impl NodeApi for NodeClient {
    async fn account(
        &self,
        session: &Session,
        address: &str,
        ledger_version: Option<u64>,
    ) -> RegistrarResult<AccountRecord> {
        let url = match ledger_version {
            Some(version) => format!(
                "{}/accounts/{}?ledger_version={}",
                self.base_url, address, version
            ),
            None => format!("{}/accounts/{}", self.base_url, address),
        };

        let response = Self::check(session.http().get(&url).send().await?).await?;
        response
            .json()
            .await
            .map_err(|e| RegistrarError::Response(format!("malformed account record: {}", e)))
    }

    async fn encode_submission(
        &self,
        session: &Session,
        request: &TransactionRequest,
    ) -> RegistrarResult<Vec<u8>> {
        let url = format!("{}/transactions/encode_submission", self.base_url);
        let response = Self::check(session.http().post(&url).json(request).send().await?).await?;

        // The node returns a JSON string of 0x-prefixed hex
        let payload: String = response
            .json()
            .await
            .map_err(|e| RegistrarError::Response(format!("malformed signing payload: {}", e)))?;
        let stripped = payload.strip_prefix("0x").unwrap_or(&payload);
        hex::decode(stripped)
            .map_err(|e| RegistrarError::Response(format!("bad signing payload hex: {}", e)))
    }

    async fn submit(
        &self,
        session: &Session,
        signed: &SignedTransaction,
    ) -> RegistrarResult<String> {
        let url = format!("{}/transactions", self.base_url);
        let response = Self::check(session.http().post(&url).json(signed).send().await?).await?;

        let submitted: SubmitResponse = response
            .json()
            .await
            .map_err(|e| RegistrarError::Response(format!("malformed submit response: {}", e)))?;
        Ok(submitted.hash)
    }

    async fn transaction_by_hash(
        &self,
        session: &Session,
        hash: &str,
    ) -> RegistrarResult<Option<TransactionRecord>> {
        let url = format!("{}/transactions/by_hash/{}", self.base_url, hash);
        let response = session.http().get(&url).send().await?;

        // An unknown hash is not an error: the submission may simply not
        // have reached this node yet
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::check(response).await?;
        let record = response
            .json()
            .await
            .map_err(|e| RegistrarError::Response(format!("malformed transaction record: {}", e)))?;
        Ok(Some(record))
    }
}
