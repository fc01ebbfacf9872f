#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Transaction serialization for signing and broadcast.
//!
//! Two variants are supported: the legacy single gas price transaction and
//! the incentive transaction, a typed fee market transaction carrying an
//! incentive beneficiary. Each variant owns its field layout and its rule for
//! turning a signer's recovery value into the `v` written on the wire.

mod incentive;
mod legacy;
pub mod rlp;
mod signature;

use abi::{keccak256, Address};

pub use incentive::{IncentiveTransaction, INCENTIVE_TX_TYPE};
pub use legacy::LegacyTransaction;
pub use signature::{Signature, TxHash};

use crate::rlp::{trim_leading_zeros, Rlp};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("signature recovery value {v} is not valid for this transaction")]
    InvalidRecoveryId { v: u64 },

    #[error("chain id {chain_id} is too large for a replay protected signature")]
    ChainIdOutOfRange { chain_id: u64 },

    #[error("invalid transaction hash {0:?}")]
    InvalidHash(String),

    #[error("decode hex error")]
    FromHex(#[from] hex::FromHexError),
}

/// The fields a transaction variant contributes to its canonical encoding.
pub trait Serializable {
    /// Envelope type prefix, `None` for untyped transactions
    fn type_byte(&self) -> Option<u8>;

    /// Ordered RLP fields. `signature` is the wire `v` with trimmed `r` and `s`,
    /// appended only once signing has completed.
    fn rlp_fields(&self, signature: Option<(u64, &[u8], &[u8])>) -> Vec<Rlp>;

    /// The `v` value written on the wire for a signer's raw signature.
    fn encoded_v(&self, signature: &Signature) -> Result<u64>;

    /// Bytes that are hashed and signed.
    fn signing_preimage(&self) -> Vec<u8> {
        envelope(self.type_byte(), Rlp::list(self.rlp_fields(None)))
    }

    fn signing_hash(&self) -> [u8; 32] {
        keccak256(self.signing_preimage())
    }
}

/// A transaction that has not been signed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Legacy(LegacyTransaction),
    Incentive(IncentiveTransaction),
}

impl Transaction {
    fn fields(&self) -> &dyn Serializable {
        match self {
            Transaction::Legacy(tx) => tx,
            Transaction::Incentive(tx) => tx,
        }
    }

    /// Attaches a signature over [`Serializable::signing_preimage`]. Consumes the
    /// transaction so its nonce can only be broadcast once.
    pub fn into_signed(self, signature: Signature) -> Result<SignedTransaction> {
        let v = self.encoded_v(&signature)?;
        Ok(SignedTransaction {
            r: trim_leading_zeros(&signature.r).to_vec(),
            s: trim_leading_zeros(&signature.s).to_vec(),
            v,
            tx: self,
        })
    }
}

impl Serializable for Transaction {
    fn type_byte(&self) -> Option<u8> {
        self.fields().type_byte()
    }

    fn rlp_fields(&self, signature: Option<(u64, &[u8], &[u8])>) -> Vec<Rlp> {
        self.fields().rlp_fields(signature)
    }

    fn encoded_v(&self, signature: &Signature) -> Result<u64> {
        self.fields().encoded_v(signature)
    }
}

impl From<LegacyTransaction> for Transaction {
    fn from(tx: LegacyTransaction) -> Self {
        Transaction::Legacy(tx)
    }
}

impl From<IncentiveTransaction> for Transaction {
    fn from(tx: IncentiveTransaction) -> Self {
        Transaction::Incentive(tx)
    }
}

/// A transaction together with its wire signature, ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    tx: Transaction,
    v: u64,
    r: Vec<u8>,
    s: Vec<u8>,
}

impl SignedTransaction {
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn v(&self) -> u64 {
        self.v
    }

    pub fn encode(&self) -> Vec<u8> {
        let fields = self
            .tx
            .rlp_fields(Some((self.v, self.r.as_slice(), self.s.as_slice())));
        envelope(self.tx.type_byte(), Rlp::list(fields))
    }

    pub fn hash(&self) -> TxHash {
        TxHash(keccak256(self.encode()))
    }
}

fn envelope(type_byte: Option<u8>, list: Rlp) -> Vec<u8> {
    let mut out = Vec::new();
    if let Some(type_byte) = type_byte {
        out.push(type_byte);
    }
    out.extend(list.encode());
    out
}

/// An absent address is the empty string, never a numeric zero.
pub(crate) fn recipient(address: Option<&Address>) -> Rlp {
    match address {
        Some(address) => Rlp::bytes(address.as_bytes().to_vec()),
        None => Rlp::empty(),
    }
}
