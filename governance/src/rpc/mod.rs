//! Port to the chain node. Everything the workflow needs from the network goes
//! through [`NodeRpc`].

pub mod http;

use abi::{Address, U256};
use std::fmt;
use transaction::TxHash;

pub type Result<T> = std::result::Result<T, RpcError>;

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("http error")]
    Http(#[from] reqwest::Error),

    #[error("node returned error {code}: {message}")]
    Node { code: i64, message: String },

    #[error("node returned no result for {method}")]
    MissingResult { method: &'static str },

    #[error("invalid {method} response: {reason}")]
    InvalidResponse { method: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Pending,
    Earliest,
    Number(u64),
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockTag::Latest => write!(f, "latest"),
            BlockTag::Pending => write!(f, "pending"),
            BlockTag::Earliest => write!(f, "earliest"),
            BlockTag::Number(n) => write!(f, "0x{n:x}"),
        }
    }
}

/// An event emitted by a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<[u8; 32]>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    /// `1` on success, `0` when execution reverted
    pub status: u64,
    pub logs: Vec<Log>,
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        self.status == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub number: u64,
    pub gas_limit: U256,
}

#[async_trait::async_trait]
pub trait NodeRpc: Send + Sync {
    async fn send_raw_transaction(&self, bytes: &[u8]) -> Result<TxHash>;

    async fn get_transaction_receipt(&self, hash: &TxHash) -> Result<Option<Receipt>>;

    /// Read-only contract call, `from` is left out when `None`.
    async fn call(
        &self,
        from: Option<Address>,
        to: Address,
        data: &[u8],
        block: BlockTag,
    ) -> Result<Vec<u8>>;

    async fn get_transaction_count(&self, address: Address, block: BlockTag) -> Result<U256>;

    async fn gas_price(&self) -> Result<U256>;

    async fn get_block(&self, block: BlockTag) -> Result<Block>;

    async fn chain_id(&self) -> Result<u64>;

    /// Chain specific node status (`axm_status`).
    async fn status(&self) -> Result<String>;
}
