use crate::rpc::{self, BlockTag, NodeRpc};
use abi::U256;
use tracing::debug;

/// Supplies gas parameters for an encoded contract call.
pub trait FeePolicy: Send + Sync {
    fn gas_price(&self, payload: &[u8]) -> U256;

    fn gas_limit(&self, payload: &[u8]) -> U256;
}

/// The same price and limit for every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticFeePolicy {
    pub gas_price: U256,
    pub gas_limit: U256,
}

impl StaticFeePolicy {
    pub fn new(gas_price: impl Into<U256>, gas_limit: impl Into<U256>) -> Self {
        Self {
            gas_price: gas_price.into(),
            gas_limit: gas_limit.into(),
        }
    }
}

impl FeePolicy for StaticFeePolicy {
    fn gas_price(&self, _payload: &[u8]) -> U256 {
        self.gas_price
    }

    fn gas_limit(&self, _payload: &[u8]) -> U256 {
        self.gas_limit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasParams {
    pub gas_price: U256,
    pub gas_limit: U256,
}

/// Gas parameters from the policy, or best effort from the node: its current
/// gas price and the latest block's gas limit.
pub(crate) async fn resolve(
    policy: Option<&dyn FeePolicy>,
    rpc: &dyn NodeRpc,
    payload: &[u8],
) -> rpc::Result<GasParams> {
    if let Some(policy) = policy {
        return Ok(GasParams {
            gas_price: policy.gas_price(payload),
            gas_limit: policy.gas_limit(payload),
        });
    }

    let gas_price = rpc.gas_price().await?;
    let block = rpc.get_block(BlockTag::Latest).await?;
    debug!(%gas_price, gas_limit = %block.gas_limit, block = block.number, "gas from node");

    Ok(GasParams {
        gas_price,
        gas_limit: block.gas_limit,
    })
}
