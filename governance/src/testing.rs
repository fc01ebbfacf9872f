//! In-memory node and sleeper used by the unit tests.

use crate::{
    poll::Sleeper,
    rpc::{self, Block, BlockTag, Log, NodeRpc, Receipt, RpcError},
};
use abi::{keccak256, Address, U256};
use parking_lot::{Mutex, MutexGuard};
use std::time::Duration;
use transaction::TxHash;

pub(crate) struct NodeState {
    pub calls: Vec<&'static str>,
    pub nonce: U256,
    pub gas_price: U256,
    pub block_gas_limit: U256,
    pub chain_id: u64,
    /// Receipt returned from the given query onwards (1-based)
    pub receipt_after: Option<(u32, Receipt)>,
    pub receipt_queries: u32,
    pub fail_receipts: bool,
    pub fail_broadcast: bool,
    pub broadcasts: Vec<Vec<u8>>,
    pub call_result: Vec<u8>,
    pub last_call: Option<(Option<Address>, Address, Vec<u8>, BlockTag)>,
    pub status: String,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            calls: vec![],
            nonce: U256::from(3u64),
            gas_price: U256::from(1_000_000_000u64),
            block_gas_limit: U256::from(30_000_000u64),
            chain_id: 1356,
            receipt_after: None,
            receipt_queries: 0,
            fail_receipts: false,
            fail_broadcast: false,
            broadcasts: vec![],
            call_result: vec![],
            last_call: None,
            status: "normal".to_string(),
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeNode {
    state: Mutex<NodeState>,
}

impl FakeNode {
    pub fn state(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock()
    }

    pub fn calls(&self, method: &str) -> usize {
        self.state.lock().calls.iter().filter(|m| **m == method).count()
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().calls.len()
    }

    fn record(&self, method: &'static str) -> MutexGuard<'_, NodeState> {
        let mut state = self.state.lock();
        state.calls.push(method);
        state
    }
}

#[async_trait::async_trait]
impl NodeRpc for FakeNode {
    async fn send_raw_transaction(&self, bytes: &[u8]) -> rpc::Result<TxHash> {
        let mut state = self.record("eth_sendRawTransaction");
        if state.fail_broadcast {
            return Err(RpcError::Node {
                code: -32000,
                message: "nonce too low".to_string(),
            });
        }
        state.broadcasts.push(bytes.to_vec());
        Ok(TxHash(keccak256(bytes)))
    }

    async fn get_transaction_receipt(&self, _hash: &TxHash) -> rpc::Result<Option<Receipt>> {
        let mut state = self.record("eth_getTransactionReceipt");
        if state.fail_receipts {
            return Err(RpcError::MissingResult {
                method: "eth_getTransactionReceipt",
            });
        }
        state.receipt_queries += 1;
        let queries = state.receipt_queries;
        Ok(match &state.receipt_after {
            Some((after, receipt)) if queries >= *after => Some(receipt.clone()),
            _ => None,
        })
    }

    async fn call(
        &self,
        from: Option<Address>,
        to: Address,
        data: &[u8],
        block: BlockTag,
    ) -> rpc::Result<Vec<u8>> {
        let mut state = self.record("eth_call");
        state.last_call = Some((from, to, data.to_vec(), block));
        Ok(state.call_result.clone())
    }

    async fn get_transaction_count(&self, _address: Address, _block: BlockTag) -> rpc::Result<U256> {
        Ok(self.record("eth_getTransactionCount").nonce)
    }

    async fn gas_price(&self) -> rpc::Result<U256> {
        Ok(self.record("eth_gasPrice").gas_price)
    }

    async fn get_block(&self, _block: BlockTag) -> rpc::Result<Block> {
        let state = self.record("eth_getBlockByNumber");
        Ok(Block {
            number: 100,
            gas_limit: state.block_gas_limit,
        })
    }

    async fn chain_id(&self) -> rpc::Result<u64> {
        Ok(self.record("eth_chainId").chain_id)
    }

    async fn status(&self) -> rpc::Result<String> {
        Ok(self.record("axm_status").status.clone())
    }
}

#[derive(Default)]
pub(crate) struct FakeSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }
}

#[async_trait::async_trait]
impl Sleeper for FakeSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
    }
}

pub(crate) fn receipt(tx_hash: TxHash, status: u64, logs: Vec<Log>) -> Receipt {
    Receipt {
        transaction_hash: tx_hash,
        block_number: Some(101),
        status,
        logs,
    }
}

pub(crate) fn log(topics: Vec<[u8; 32]>) -> Log {
    Log {
        address: Address::new([0; 20]),
        topics,
        data: vec![],
    }
}
