//! Recursive length prefix encoding.

use abi::U256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rlp {
    Bytes(Vec<u8>),
    List(Vec<Rlp>),
}

impl Rlp {
    /// The zero-length string, `0x80` on the wire
    pub fn empty() -> Self {
        Rlp::Bytes(vec![])
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Rlp::Bytes(bytes.into())
    }

    /// Big-endian with leading zero bytes removed, so zero is the empty string.
    pub fn uint(value: &U256) -> Self {
        let mut word = [0u8; 32];
        value.to_big_endian(&mut word);
        Rlp::Bytes(trim_leading_zeros(&word).to_vec())
    }

    pub fn u64(value: u64) -> Self {
        Rlp::Bytes(trim_leading_zeros(&value.to_be_bytes()).to_vec())
    }

    pub fn list(items: Vec<Rlp>) -> Self {
        Rlp::List(items)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_to(&mut out);
        out
    }

    fn encode_to(&self, out: &mut Vec<u8>) {
        match self {
            Rlp::Bytes(bytes) if bytes.len() == 1 && bytes[0] < 0x80 => out.push(bytes[0]),
            Rlp::Bytes(bytes) => {
                encode_length(bytes.len(), 0x80, out);
                out.extend_from_slice(bytes);
            }
            Rlp::List(items) => {
                let mut payload = Vec::new();
                for item in items {
                    item.encode_to(&mut payload);
                }
                encode_length(payload.len(), 0xc0, out);
                out.extend(payload);
            }
        }
    }
}

fn encode_length(len: usize, offset: u8, out: &mut Vec<u8>) {
    if len < 56 {
        out.push(offset + len as u8);
    } else {
        let len_bytes = (len as u64).to_be_bytes();
        let len_bytes = trim_leading_zeros(&len_bytes);
        out.push(offset + 55 + len_bytes.len() as u8);
        out.extend_from_slice(len_bytes);
    }
}

pub fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[first..]
}
