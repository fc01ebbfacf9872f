use crate::{rpc::RpcError, signer::SignerError};
use transaction::TxHash;

pub type Result<T> = std::result::Result<T, GovernError>;

#[derive(Debug, thiserror::Error)]
pub enum GovernError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("transport error")]
    Transport(#[from] RpcError),

    #[error("failed to decode contract response")]
    Decode(#[from] abi::Error),

    #[error("failed to encode contract call")]
    Encode(#[source] abi::Error),

    #[error("failed to sign transaction")]
    Signer(#[from] SignerError),

    #[error("failed to serialize transaction")]
    Transaction(#[from] transaction::Error),

    #[error("transaction {tx_hash} failed on chain")]
    TransactionRejected { tx_hash: TxHash },

    #[error("receipt not generated for transaction {tx_hash}, it may still be included")]
    ReceiptTimeout { tx_hash: TxHash },

    #[error("transaction {tx_hash} succeeded but emitted no proposal id")]
    IdentifierMissing { tx_hash: TxHash },
}

impl GovernError {
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        GovernError::Validation(reason.into())
    }

    /// Stable classification used in logs and command output.
    pub fn code(&self) -> &'static str {
        match self {
            GovernError::Validation(_) | GovernError::Encode(_) => "validation",
            GovernError::Transport(_) => "transport",
            GovernError::Decode(_) => "decode",
            GovernError::Signer(_) | GovernError::Transaction(_) => "signing",
            GovernError::TransactionRejected { .. } => "transaction-rejected",
            GovernError::ReceiptTimeout { .. } => "receipt-timeout",
            GovernError::IdentifierMissing { .. } => "identifier-missing",
        }
    }

    /// Hash of the broadcast transaction, when the failure happened after broadcast.
    pub fn tx_hash(&self) -> Option<&TxHash> {
        match self {
            GovernError::TransactionRejected { tx_hash }
            | GovernError::ReceiptTimeout { tx_hash }
            | GovernError::IdentifierMissing { tx_hash } => Some(tx_hash),
            _ => None,
        }
    }
}
