use abi::{Address, U256};

use crate::{rlp::Rlp, Error, Result, Serializable, Signature};

/// Envelope type byte of the incentive transaction.
pub const INCENTIVE_TX_TYPE: u8 = 0x04;

/// Fee market transaction that names a beneficiary for the incentive paid by
/// the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncentiveTransaction {
    pub chain_id: u64,
    pub nonce: U256,
    pub max_priority_fee_per_gas: U256,
    pub max_fee_per_gas: U256,
    pub gas_limit: U256,
    /// `None` creates a contract
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    /// Always serialized, as the empty string when not set
    pub incentive_address: Option<Address>,
}

impl IncentiveTransaction {
    /// y-parity from either the bare recovery id, the 27/28 form or a replay
    /// protected `v` of this chain.
    fn recovery_id(&self, raw: u64) -> Result<u64> {
        let parity = match raw {
            0 | 1 => Some(raw),
            27 | 28 => Some(raw - 27),
            v if v >= 35 => {
                let offset = self
                    .chain_id
                    .checked_mul(2)
                    .ok_or(Error::ChainIdOutOfRange {
                        chain_id: self.chain_id,
                    })?;
                (v - 35)
                    .checked_sub(offset)
                    .filter(|parity| *parity <= 1)
            }
            _ => None,
        };
        parity.ok_or(Error::InvalidRecoveryId { v: raw })
    }
}

impl Serializable for IncentiveTransaction {
    fn type_byte(&self) -> Option<u8> {
        Some(INCENTIVE_TX_TYPE)
    }

    fn rlp_fields(&self, signature: Option<(u64, &[u8], &[u8])>) -> Vec<Rlp> {
        let mut fields = vec![
            Rlp::u64(self.chain_id),
            Rlp::uint(&self.nonce),
            Rlp::uint(&self.max_priority_fee_per_gas),
            Rlp::uint(&self.max_fee_per_gas),
            Rlp::uint(&self.gas_limit),
            crate::recipient(self.to.as_ref()),
            Rlp::uint(&self.value),
            Rlp::bytes(self.data.clone()),
            // access list
            Rlp::list(vec![]),
            crate::recipient(self.incentive_address.as_ref()),
        ];

        if let Some((v, r, s)) = signature {
            fields.push(Rlp::u64(v));
            fields.push(Rlp::bytes(r));
            fields.push(Rlp::bytes(s));
        }

        fields
    }

    fn encoded_v(&self, signature: &Signature) -> Result<u64> {
        self.recovery_id(signature.v)
    }
}
