use crate::{rpc::NodeRpc, signer::Signer, Result};
use tracing::{debug, warn};
use transaction::{Serializable, SignedTransaction, Transaction, TxHash};

/// Signs the transaction's preimage. `r` and `s` are trimmed when the signed
/// transaction is encoded.
pub fn sign(signer: &dyn Signer, tx: Transaction) -> Result<SignedTransaction> {
    let signature = signer.sign(&tx.signing_preimage())?;
    Ok(tx.into_signed(signature)?)
}

/// Broadcasts a signed transaction once. Failures are returned to the caller
/// and never retried, a retry could reuse the nonce.
pub async fn submit(rpc: &dyn NodeRpc, signed: &SignedTransaction) -> Result<TxHash> {
    let expected = signed.hash();
    let tx_hash = rpc.send_raw_transaction(&signed.encode()).await?;
    if tx_hash != expected {
        warn!(%tx_hash, %expected, "node reported a different transaction hash");
    }
    debug!(%tx_hash, "transaction broadcast");
    Ok(tx_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{signer::LocalSigner, testing::FakeNode, GovernError};
    use abi::{Address, U256};
    use transaction::LegacyTransaction;

    fn transfer() -> Transaction {
        Transaction::Legacy(LegacyTransaction {
            nonce: U256::zero(),
            gas_price: U256::from(1u64),
            gas_limit: U256::from(21000u64),
            to: Some(Address::new([0x22; 20])),
            value: U256::zero(),
            data: vec![],
            chain_id: Some(1356),
        })
    }

    #[tokio::test]
    async fn test_submit_broadcasts_signed_bytes() {
        let node = FakeNode::default();
        let signer = LocalSigner::generate().unwrap();

        let signed = sign(&signer, transfer()).unwrap();
        let tx_hash = submit(&node, &signed).await.unwrap();

        assert_eq!(tx_hash, signed.hash());
        assert_eq!(node.state().broadcasts, vec![signed.encode()]);
    }

    #[tokio::test]
    async fn test_broadcast_error_is_not_retried() {
        let node = FakeNode::default();
        node.state().fail_broadcast = true;
        let signer = LocalSigner::generate().unwrap();

        let signed = sign(&signer, transfer()).unwrap();
        let err = submit(&node, &signed).await.unwrap_err();

        assert!(matches!(err, GovernError::Transport(_)));
        assert_eq!(node.calls("eth_sendRawTransaction"), 1);
    }
}
