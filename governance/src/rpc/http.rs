//! JSON-RPC 2.0 over HTTP.

use super::{Block, BlockTag, Log, NodeRpc, Receipt, Result, RpcError};
use abi::{Address, U256};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;
use transaction::TxHash;

pub struct HttpRpc {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct Response<T> {
    result: Option<T>,
    error: Option<ResponseError>,
}

#[derive(Deserialize)]
struct ResponseError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReceipt {
    transaction_hash: TxHash,
    block_number: Option<String>,
    status: Option<String>,
    #[serde(default)]
    logs: Vec<WireLog>,
}

#[derive(Deserialize)]
struct WireLog {
    address: Address,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBlock {
    number: Option<String>,
    gas_limit: String,
}

#[derive(Deserialize)]
struct AxmStatus {
    status: String,
}

impl HttpRpc {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<Option<T>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "rpc request");

        let response: Response<T> = self
            .client
            .post(&self.url)
            .json(&Request {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(RpcError::Node {
                code: error.code,
                message: error.message,
            });
        }

        Ok(response.result)
    }

    async fn request_required<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<T> {
        self.request(method, params)
            .await?
            .ok_or(RpcError::MissingResult { method })
    }
}

#[async_trait::async_trait]
impl NodeRpc for HttpRpc {
    async fn send_raw_transaction(&self, bytes: &[u8]) -> Result<TxHash> {
        self.request_required("eth_sendRawTransaction", json!([to_data(bytes)]))
            .await
    }

    async fn get_transaction_receipt(&self, hash: &TxHash) -> Result<Option<Receipt>> {
        let receipt: Option<WireReceipt> = self
            .request("eth_getTransactionReceipt", json!([hash.to_string()]))
            .await?;
        receipt.map(WireReceipt::into_receipt).transpose()
    }

    async fn call(
        &self,
        from: Option<Address>,
        to: Address,
        data: &[u8],
        block: BlockTag,
    ) -> Result<Vec<u8>> {
        let mut call = json!({
            "to": to.to_string(),
            "data": to_data(data),
        });
        if let Some(from) = from {
            call["from"] = json!(from.to_string());
        }
        let result: String = self
            .request_required("eth_call", json!([call, block.to_string()]))
            .await?;
        parse_data("eth_call", &result)
    }

    async fn get_transaction_count(&self, address: Address, block: BlockTag) -> Result<U256> {
        let result: String = self
            .request_required(
                "eth_getTransactionCount",
                json!([address.to_string(), block.to_string()]),
            )
            .await?;
        parse_quantity("eth_getTransactionCount", &result)
    }

    async fn gas_price(&self) -> Result<U256> {
        let result: String = self.request_required("eth_gasPrice", json!([])).await?;
        parse_quantity("eth_gasPrice", &result)
    }

    async fn get_block(&self, block: BlockTag) -> Result<Block> {
        let result: WireBlock = self
            .request_required("eth_getBlockByNumber", json!([block.to_string(), false]))
            .await?;
        result.into_block()
    }

    async fn chain_id(&self) -> Result<u64> {
        let result: String = self.request_required("eth_chainId", json!([])).await?;
        parse_u64("eth_chainId", &result)
    }

    async fn status(&self) -> Result<String> {
        let result: AxmStatus = self.request_required("axm_status", json!([])).await?;
        Ok(result.status)
    }
}

impl WireReceipt {
    fn into_receipt(self) -> Result<Receipt> {
        const METHOD: &str = "eth_getTransactionReceipt";

        let block_number = self
            .block_number
            .map(|n| parse_u64(METHOD, &n))
            .transpose()?;
        // A receipt without a status field is treated as failed
        let status = self
            .status
            .map(|s| parse_u64(METHOD, &s))
            .transpose()?
            .unwrap_or(0);
        let logs = self
            .logs
            .into_iter()
            .map(|log| -> Result<Log> {
                Ok(Log {
                    address: log.address,
                    topics: log
                        .topics
                        .iter()
                        .map(|t| parse_topic(METHOD, t))
                        .collect::<Result<_>>()?,
                    data: parse_data(METHOD, &log.data)?,
                })
            })
            .collect::<Result<_>>()?;

        Ok(Receipt {
            transaction_hash: self.transaction_hash,
            block_number,
            status,
            logs,
        })
    }
}

impl WireBlock {
    fn into_block(self) -> Result<Block> {
        const METHOD: &str = "eth_getBlockByNumber";
        Ok(Block {
            number: self
                .number
                .map(|n| parse_u64(METHOD, &n))
                .transpose()?
                .unwrap_or_default(),
            gas_limit: parse_quantity(METHOD, &self.gas_limit)?,
        })
    }
}

fn to_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn invalid(method: &'static str, reason: impl Into<String>) -> RpcError {
    RpcError::InvalidResponse {
        method,
        reason: reason.into(),
    }
}

fn parse_quantity(method: &'static str, value: &str) -> Result<U256> {
    let digits = value.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| invalid(method, format!("bad quantity {value:?}: {e:?}")))
}

fn parse_u64(method: &'static str, value: &str) -> Result<u64> {
    let quantity = parse_quantity(method, value)?;
    if quantity.bits() > 64 {
        return Err(invalid(method, format!("quantity {value:?} exceeds 64 bits")));
    }
    Ok(quantity.low_u64())
}

fn parse_data(method: &'static str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value.trim_start_matches("0x"))
        .map_err(|e| invalid(method, format!("bad data {value:?}: {e}")))
}

fn parse_topic(method: &'static str, value: &str) -> Result<[u8; 32]> {
    parse_data(method, value)?
        .try_into()
        .map_err(|_| invalid(method, format!("topic {value:?} is not 32 bytes")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("m", "0x0").unwrap(), U256::zero());
        assert_eq!(parse_quantity("m", "0x").unwrap(), U256::zero());
        assert_eq!(parse_quantity("m", "0x3b9aca00").unwrap(), U256::from(1_000_000_000u64));
        assert!(parse_quantity("m", "0xzz").is_err());
        assert!(parse_u64("m", "0x10000000000000000").is_err());
    }

    #[test]
    fn test_receipt_from_json() {
        let raw = r#"{
            "transactionHash": "0x4d41e2c5ab9737a97b7927fc3d1bbfdab2f0a46123d34661b0068e7c2e8b186d",
            "blockNumber": "0x1b4",
            "status": "0x1",
            "logs": [{
                "address": "0x0000000000000000000000000000000000001001",
                "topics": [
                    "0x1111111111111111111111111111111111111111111111111111111111111111",
                    "0x000000000000000000000000000000000000000000000000000000000000002a"
                ],
                "data": "0x"
            }]
        }"#;

        let receipt = serde_json::from_str::<WireReceipt>(raw)
            .unwrap()
            .into_receipt()
            .unwrap();

        assert!(receipt.is_success());
        assert_eq!(receipt.block_number, Some(436));
        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(receipt.logs[0].topics[1][31], 0x2a);
        assert!(receipt.logs[0].data.is_empty());
    }

    #[test]
    fn test_receipt_without_status_is_failed() {
        let raw = r#"{
            "transactionHash": "0x4d41e2c5ab9737a97b7927fc3d1bbfdab2f0a46123d34661b0068e7c2e8b186d",
            "blockNumber": null,
            "logs": []
        }"#;
        let receipt = serde_json::from_str::<WireReceipt>(raw)
            .unwrap()
            .into_receipt()
            .unwrap();
        assert!(!receipt.is_success());
        assert_eq!(receipt.block_number, None);
    }

    #[test]
    fn test_error_response() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"nonce too low"}}"#;
        let response = serde_json::from_str::<Response<String>>(raw).unwrap();
        assert!(response.result.is_none());
        let error = response.error.unwrap();
        assert_eq!(error.code, -32000);
        assert_eq!(error.message, "nonce too low");
    }

    #[test]
    fn test_block_from_json() {
        let raw = r#"{"number":"0x10","gasLimit":"0x1c9c380","hash":"0x00"}"#;
        let block = serde_json::from_str::<WireBlock>(raw)
            .unwrap()
            .into_block()
            .unwrap();
        assert_eq!(block.number, 16);
        assert_eq!(block.gas_limit, U256::from(30_000_000u64));
    }
}
