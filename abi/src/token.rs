use std::fmt;

use crate::{Address, U256, WORD};

/// Declared type of an argument or return value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// Unsigned integer of the given bit width (8..=256, multiple of 8)
    Uint(u16),
    /// Two's complement signed integer of the given bit width
    Int(u16),
    Address,
    String,
    Bytes,
    /// Dynamic length array `T[]`
    Array(Box<ParamType>),
    Tuple(Vec<ParamType>),
}

impl ParamType {
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::String | ParamType::Bytes | ParamType::Array(_) => true,
            ParamType::Tuple(types) => types.iter().any(ParamType::is_dynamic),
            _ => false,
        }
    }

    /// Number of bytes this type occupies in the head section of its parent.
    pub fn head_size(&self) -> usize {
        match self {
            ParamType::Tuple(types) if !self.is_dynamic() => {
                types.iter().map(ParamType::head_size).sum()
            }
            _ => WORD,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Uint(bits) => write!(f, "uint{bits}"),
            ParamType::Int(bits) => write!(f, "int{bits}"),
            ParamType::Address => write!(f, "address"),
            ParamType::String => write!(f, "string"),
            ParamType::Bytes => write!(f, "bytes"),
            ParamType::Array(inner) => write!(f, "{inner}[]"),
            ParamType::Tuple(types) => {
                write!(f, "(")?;
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{ty}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A typed ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Uint { bits: u16, value: U256 },
    /// Signed value stored as its 256-bit two's complement word
    Int { bits: u16, value: U256 },
    Address(Address),
    String(String),
    Bytes(Vec<u8>),
    /// Array items together with the element type, so empty arrays keep their type
    Array(ParamType, Vec<Token>),
    Tuple(Vec<Token>),
}

impl Token {
    pub fn uint(bits: u16, value: impl Into<U256>) -> Self {
        Token::Uint {
            bits,
            value: value.into(),
        }
    }

    pub fn uint8(value: u8) -> Self {
        Self::uint(8, value)
    }

    pub fn uint64(value: u64) -> Self {
        Self::uint(64, value)
    }

    pub fn int(bits: u16, value: i128) -> Self {
        let value = if value >= 0 {
            U256::from(value as u128)
        } else {
            !U256::from((-(value + 1)) as u128)
        };
        Token::Int { bits, value }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Token::String(value.into())
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Token::Bytes(value.into())
    }

    pub fn string_array<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Token::Array(
            ParamType::String,
            items.into_iter().map(|s| Token::String(s.into())).collect(),
        )
    }

    pub fn param_type(&self) -> ParamType {
        match self {
            Token::Uint { bits, .. } => ParamType::Uint(*bits),
            Token::Int { bits, .. } => ParamType::Int(*bits),
            Token::Address(_) => ParamType::Address,
            Token::String(_) => ParamType::String,
            Token::Bytes(_) => ParamType::Bytes,
            Token::Array(inner, _) => ParamType::Array(Box::new(inner.clone())),
            Token::Tuple(tokens) => {
                ParamType::Tuple(tokens.iter().map(Token::param_type).collect())
            }
        }
    }

    /// Whether this token is a valid value of `ty`, including the value range of
    /// integer types.
    pub fn type_check(&self, ty: &ParamType) -> bool {
        match (self, ty) {
            (Token::Uint { bits, value }, ParamType::Uint(expected)) => {
                bits == expected && value.bits() <= *expected as usize
            }
            (Token::Int { bits, value }, ParamType::Int(expected)) => {
                bits == expected && int_fits(value, *expected)
            }
            (Token::Address(_), ParamType::Address)
            | (Token::String(_), ParamType::String)
            | (Token::Bytes(_), ParamType::Bytes) => true,
            (Token::Array(inner, items), ParamType::Array(expected)) => {
                inner == expected.as_ref() && items.iter().all(|t| t.type_check(expected))
            }
            (Token::Tuple(tokens), ParamType::Tuple(types)) => {
                tokens.len() == types.len()
                    && tokens.iter().zip(types).all(|(t, ty)| t.type_check(ty))
            }
            _ => false,
        }
    }

    pub fn into_uint(self) -> Option<U256> {
        match self {
            Token::Uint { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn into_int(self) -> Option<U256> {
        match self {
            Token::Int { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            Token::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Token::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<Vec<Token>> {
        match self {
            Token::Array(_, items) => Some(items),
            _ => None,
        }
    }

    pub fn into_tuple(self) -> Option<Vec<Token>> {
        match self {
            Token::Tuple(tokens) => Some(tokens),
            _ => None,
        }
    }
}

pub(crate) fn int_fits(value: &U256, bits: u16) -> bool {
    if bits >= 256 {
        return true;
    }
    let magnitude = if value.bit(255) { !*value } else { *value };
    magnitude.bits() < bits as usize
}

/// Interprets a two's complement word as an `i128`, `None` if it does not fit.
pub fn int_to_i128(value: U256) -> Option<i128> {
    if value.bit(255) {
        let magnitude = !value;
        (magnitude.bits() <= 127).then(|| -(magnitude.low_u128() as i128) - 1)
    } else {
        (value.bits() <= 127).then(|| value.low_u128() as i128)
    }
}
