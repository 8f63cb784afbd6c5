//! Chain module - node API boundary and HTTP sessions
//!
//! This module provides:
//! - The `NodeApi` capability trait (account read, encode, submit, poll)
//! - Wire types for the node's REST API
//! - A reqwest-backed client implementation
//! - Proxy-bound session management

pub mod client;
pub mod session;

pub use client::NodeClient;
pub use session::{Session, SessionPool};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{RegistrarError, RegistrarResult};

/// Account record returned by `GET /accounts/{address}`
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRecord {
    pub sequence_number: String,
}

impl AccountRecord {
    /// Sequence number as an integer (string-encoded on the wire)
    pub fn sequence(&self) -> RegistrarResult<u64> {
        self.sequence_number.parse().map_err(|_| {
            RegistrarError::Response(format!(
                "non-numeric sequence number: {}",
                self.sequence_number
            ))
        })
    }
}

/// Entry-function payload of a transaction
#[derive(Debug, Clone, Serialize)]
pub struct EntryFunctionPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<serde_json::Value>,
}

impl EntryFunctionPayload {
    /// Payload calling `function` with the given arguments and no type
    /// arguments
    pub fn entry_function(function: &str, arguments: Vec<serde_json::Value>) -> Self {
        Self {
            kind: "entry_function_payload".to_string(),
            function: function.to_string(),
            type_arguments: Vec::new(),
            arguments,
        }
    }
}

/// Unsigned transaction envelope
///
/// All u64 fields are decimal strings, as the node's REST API encodes them.
/// Immutable once built; every submission attempt builds a fresh one.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRequest {
    pub sender: String,
    pub sequence_number: String,
    pub max_gas_amount: String,
    pub gas_unit_price: String,
    pub expiration_timestamp_secs: String,
    pub payload: EntryFunctionPayload,
}

/// Signature block attached to a submitted transaction
#[derive(Debug, Clone, Serialize)]
pub struct SignatureBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub public_key: String,
    pub signature: String,
}

impl SignatureBlock {
    pub fn ed25519(public_key: String, signature: String) -> Self {
        Self {
            kind: "ed25519_signature".to_string(),
            public_key,
            signature,
        }
    }
}

/// Transaction envelope plus its signature block
#[derive(Debug, Clone, Serialize)]
pub struct SignedTransaction {
    #[serde(flatten)]
    pub request: TransactionRequest,
    pub signature: SignatureBlock,
}

/// Transaction record returned by `GET /transactions/by_hash/{hash}`
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub vm_status: Option<String>,
}

impl TransactionRecord {
    /// Whether the node still reports the transaction as pending
    pub fn is_pending(&self) -> bool {
        self.kind == "pending_transaction"
    }
}

/// Node API capability: the four operations the transaction lifecycle needs
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Fetch the account record, optionally pinned to a ledger version
    async fn account(
        &self,
        session: &Session,
        address: &str,
        ledger_version: Option<u64>,
    ) -> RegistrarResult<AccountRecord>;

    /// Obtain canonical signing bytes for an unsigned transaction
    async fn encode_submission(
        &self,
        session: &Session,
        request: &TransactionRequest,
    ) -> RegistrarResult<Vec<u8>>;

    /// Submit a signed transaction, returning its hash
    async fn submit(
        &self,
        session: &Session,
        signed: &SignedTransaction,
    ) -> RegistrarResult<String>;

    /// Fetch a transaction record by hash; `None` when the node does not
    /// know the hash yet
    async fn transaction_by_hash(
        &self,
        session: &Session,
        hash: &str,
    ) -> RegistrarResult<Option<TransactionRecord>>;
}
