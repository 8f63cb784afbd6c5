//! Error types for the registrar

use thiserror::Error;

/// Main error type for the registrar
#[derive(Error, Debug)]
pub enum RegistrarError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed derivation path: {0}")]
    MalformedPath(String),

    #[error("Invalid {what} length: expected 32 bytes, got {len}")]
    InvalidKeyLength { what: &'static str, len: usize },

    #[error("Node API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Transaction {hash} timed out waiting for confirmation")]
    TransactionTimeout { hash: String },

    #[error("Transaction rejected on chain: {reason}")]
    TransactionExecution { reason: String },

    #[error("Unexpected API response: {0}")]
    Response(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistrarError {
    /// Check if error is retryable
    ///
    /// A rejected transaction counts as retryable: the retry layer rebuilds
    /// it with a fresh sequence number instead of resubmitting stale bytes.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            RegistrarError::Config(_)
                | RegistrarError::MalformedPath(_)
                | RegistrarError::InvalidKeyLength { .. }
        )
    }
}

/// Result type for registrar operations
pub type RegistrarResult<T> = Result<T, RegistrarError>;
