use crate::{token::int_fits, Address, Error, ParamType, Result, Token, U256, WORD};

/// Decodes `data` as a parameter list of the given types.
///
/// Empty input decodes to an empty list, which is what a node returns for a
/// call that produced no data.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>> {
    if data.is_empty() {
        return Ok(vec![]);
    }
    decode_params(types, data, 0)
}

fn decode_params(types: &[ParamType], data: &[u8], base: usize) -> Result<Vec<Token>> {
    let mut tokens = Vec::with_capacity(types.len());
    let mut head = base;

    for ty in types {
        let token = if ty.is_dynamic() {
            let offset = read_usize(data, head)?;
            let start = base.checked_add(offset).ok_or(Error::OffsetOutOfBounds {
                offset: offset.to_string(),
                len: data.len(),
            })?;
            if start > data.len() {
                return Err(Error::OffsetOutOfBounds {
                    offset: start.to_string(),
                    len: data.len(),
                });
            }
            decode_token(ty, data, start)?
        } else {
            decode_token(ty, data, head)?
        };
        head += ty.head_size();
        tokens.push(token);
    }

    Ok(tokens)
}

fn decode_token(ty: &ParamType, data: &[u8], at: usize) -> Result<Token> {
    match ty {
        ParamType::Uint(bits) => {
            let value = U256::from_big_endian(read_word(data, at)?);
            if value.bits() > *bits as usize {
                return Err(Error::ValueOutOfRange { ty: ty.to_string() });
            }
            Ok(Token::Uint { bits: *bits, value })
        }
        ParamType::Int(bits) => {
            let value = U256::from_big_endian(read_word(data, at)?);
            if !int_fits(&value, *bits) {
                return Err(Error::ValueOutOfRange { ty: ty.to_string() });
            }
            Ok(Token::Int { bits: *bits, value })
        }
        ParamType::Address => {
            let word = read_word(data, at)?;
            Ok(Token::Address(Address::from_slice(&word[12..])?))
        }
        ParamType::Bytes => Ok(Token::Bytes(read_bytes(data, at)?.to_vec())),
        ParamType::String => Ok(Token::String(String::from_utf8(
            read_bytes(data, at)?.to_vec(),
        )?)),
        ParamType::Array(inner) => {
            let len = read_usize(data, at)?;
            let start = at + WORD;
            // Every element takes at least one word in the head
            let remaining = data.len().saturating_sub(start);
            if len > remaining / WORD {
                return Err(Error::OffsetOutOfBounds {
                    offset: len.to_string(),
                    len: data.len(),
                });
            }
            let types = vec![inner.as_ref().clone(); len];
            Ok(Token::Array(
                inner.as_ref().clone(),
                decode_params(&types, data, start)?,
            ))
        }
        ParamType::Tuple(types) => Ok(Token::Tuple(decode_params(types, data, at)?)),
    }
}

fn read_word(data: &[u8], at: usize) -> Result<&[u8]> {
    match at.checked_add(WORD) {
        Some(end) if end <= data.len() => Ok(&data[at..end]),
        _ => Err(Error::InsufficientData {
            offset: at,
            len: data.len(),
        }),
    }
}

fn read_usize(data: &[u8], at: usize) -> Result<usize> {
    let value = U256::from_big_endian(read_word(data, at)?);
    if value.bits() > usize::BITS as usize {
        return Err(Error::OffsetOutOfBounds {
            offset: value.to_string(),
            len: data.len(),
        });
    }
    Ok(value.low_u64() as usize)
}

fn read_bytes(data: &[u8], at: usize) -> Result<&[u8]> {
    let len = read_usize(data, at)?;
    let start = at + WORD;
    match start.checked_add(len) {
        Some(end) if end <= data.len() => Ok(&data[start..end]),
        _ => Err(Error::OffsetOutOfBounds {
            offset: len.to_string(),
            len: data.len(),
        }),
    }
}
