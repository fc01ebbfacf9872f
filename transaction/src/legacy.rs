use abi::{Address, U256};

use crate::{rlp::Rlp, Error, Result, Serializable, Signature};

/// Single gas price transaction. With a chain id the signature is replay
/// protected, without one it uses the plain 27/28 form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
    /// `None` creates a contract
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    pub chain_id: Option<u64>,
}

impl LegacyTransaction {
    fn recovery_id(raw: u64) -> Result<u64> {
        match raw {
            0 | 1 => Ok(raw),
            27 | 28 => Ok(raw - 27),
            v => Err(Error::InvalidRecoveryId { v }),
        }
    }
}

impl Serializable for LegacyTransaction {
    fn type_byte(&self) -> Option<u8> {
        None
    }

    fn rlp_fields(&self, signature: Option<(u64, &[u8], &[u8])>) -> Vec<Rlp> {
        let mut fields = vec![
            Rlp::uint(&self.nonce),
            Rlp::uint(&self.gas_price),
            Rlp::uint(&self.gas_limit),
            crate::recipient(self.to.as_ref()),
            Rlp::uint(&self.value),
            Rlp::bytes(self.data.clone()),
        ];

        match (signature, self.chain_id) {
            (Some((v, r, s)), _) => {
                fields.push(Rlp::u64(v));
                fields.push(Rlp::bytes(r));
                fields.push(Rlp::bytes(s));
            }
            (None, Some(chain_id)) => {
                fields.push(Rlp::u64(chain_id));
                fields.push(Rlp::empty());
                fields.push(Rlp::empty());
            }
            (None, None) => {}
        }

        fields
    }

    fn encoded_v(&self, signature: &Signature) -> Result<u64> {
        let recovery_id = Self::recovery_id(signature.v)?;
        match self.chain_id {
            Some(chain_id) => chain_id
                .checked_mul(2)
                .and_then(|v| v.checked_add(35 + recovery_id))
                .ok_or(Error::ChainIdOutOfRange { chain_id }),
            None => Ok(recovery_id + 27),
        }
    }
}
