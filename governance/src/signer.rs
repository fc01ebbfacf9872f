use abi::{keccak256, Address};
use rand::RngCore;
use secp256k1::{Message, PublicKey, SecretKey, SECP256K1};
use transaction::Signature;

#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("secp256k1 error")]
    Secp256k1(#[from] secp256k1::Error),

    #[error("decode hex error")]
    FromHex(#[from] hex::FromHexError),
}

pub type Result<T> = std::result::Result<T, SignerError>;

/// Signing capability for an account. Key storage and curve math stay behind
/// this trait.
pub trait Signer: Send + Sync {
    fn address(&self) -> Address;

    /// Signs the keccak-256 hash of `preimage`.
    fn sign(&self, preimage: &[u8]) -> Result<Signature>;
}

/// Signs with an in-memory secp256k1 secret key.
pub struct LocalSigner {
    secret_key: SecretKey,
    address: Address,
}

impl LocalSigner {
    pub fn new(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(SECP256K1, &secret_key);
        // drop the 0x04 prefix of the uncompressed encoding
        let address = Address::from_public_key(&public_key.serialize_uncompressed()[1..]);
        Self {
            secret_key,
            address,
        }
    }

    /// Secret key encoded as hex, with or without a `0x` prefix
    pub fn from_hex(secret_key: &str) -> Result<Self> {
        let bytes = hex::decode(secret_key.trim_start_matches("0x"))?;
        Ok(Self::new(SecretKey::from_slice(&bytes)?))
    }

    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Ok(Self::new(SecretKey::from_slice(&bytes)?))
    }

    pub fn secret_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }
}

impl Signer for LocalSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn sign(&self, preimage: &[u8]) -> Result<Signature> {
        let message = Message::from_slice(&keccak256(preimage))?;
        let (recovery_id, compact) = SECP256K1
            .sign_ecdsa_recoverable(&message, &self.secret_key)
            .serialize_compact();

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[..32]);
        s.copy_from_slice(&compact[32..]);

        Ok(Signature {
            v: 27 + recovery_id.to_i32() as u64,
            r,
            s,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abi::U256;
    use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
    use transaction::{LegacyTransaction, Serializable, Transaction};

    const KEY: &str = "4646464646464646464646464646464646464646464646464646464646464646";

    #[test]
    fn test_address_from_key() {
        let signer = LocalSigner::from_hex(&format!("0x{KEY}")).unwrap();
        assert_eq!(
            signer.address().to_string(),
            "0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f"
        );
        assert_eq!(signer.secret_key_hex(), KEY);
    }

    #[test]
    fn test_sign_replay_protected_transfer() {
        let signer = LocalSigner::from_hex(KEY).unwrap();
        let tx = Transaction::Legacy(LegacyTransaction {
            nonce: U256::from(9u64),
            gas_price: U256::from(20_000_000_000u64),
            gas_limit: U256::from(21000u64),
            to: Some(Address::new([0x35; 20])),
            value: U256::from(1_000_000_000_000_000_000u64),
            data: vec![],
            chain_id: Some(1),
        });

        let signature = signer.sign(&tx.signing_preimage()).unwrap();
        assert_eq!(
            hex::encode(signature.r),
            "28ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276"
        );
        assert_eq!(
            hex::encode(signature.s),
            "67cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
        assert_eq!(tx.into_signed(signature).unwrap().v(), 37);
    }

    #[test]
    fn test_signature_recovers_signer() {
        let signer = LocalSigner::generate().unwrap();
        let preimage = b"governance";
        let signature = signer.sign(preimage).unwrap();
        assert!(signature.v == 27 || signature.v == 28);

        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&signature.r);
        compact[32..].copy_from_slice(&signature.s);
        let recoverable = RecoverableSignature::from_compact(
            &compact,
            RecoveryId::from_i32(signature.v as i32 - 27).unwrap(),
        )
        .unwrap();
        let message = Message::from_slice(&keccak256(preimage)).unwrap();
        let public_key = SECP256K1.recover_ecdsa(&message, &recoverable).unwrap();

        assert_eq!(
            Address::from_public_key(&public_key.serialize_uncompressed()[1..]),
            signer.address()
        );
    }

    #[test]
    fn test_invalid_key() {
        assert!(LocalSigner::from_hex("zz").is_err());
        assert!(LocalSigner::from_hex(&"00".repeat(32)).is_err());
    }
}
