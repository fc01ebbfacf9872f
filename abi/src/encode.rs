use crate::{Token, U256, WORD};

/// Encodes `tokens` as a parameter list, i.e. the argument block of a call
/// without the selector.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    encode_params(tokens)
}

fn encode_params(tokens: &[Token]) -> Vec<u8> {
    let heads_len: usize = tokens.iter().map(|t| t.param_type().head_size()).sum();

    let mut head = Vec::with_capacity(heads_len);
    let mut tail = Vec::new();

    for token in tokens {
        if token.param_type().is_dynamic() {
            head.extend_from_slice(&usize_word(heads_len + tail.len()));
            tail.extend(encode_token(token));
        } else {
            head.extend(encode_token(token));
        }
    }

    head.extend(tail);
    head
}

fn encode_token(token: &Token) -> Vec<u8> {
    match token {
        Token::Uint { value, .. } | Token::Int { value, .. } => u256_word(value).to_vec(),
        Token::Address(address) => {
            let mut word = [0u8; WORD];
            word[12..].copy_from_slice(address.as_bytes());
            word.to_vec()
        }
        Token::String(s) => encode_bytes(s.as_bytes()),
        Token::Bytes(b) => encode_bytes(b),
        Token::Array(_, items) => {
            let mut out = usize_word(items.len()).to_vec();
            out.extend(encode_params(items));
            out
        }
        Token::Tuple(tokens) => encode_params(tokens),
    }
}

fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    let padded = (bytes.len() + WORD - 1) / WORD * WORD;
    let mut out = Vec::with_capacity(WORD + padded);
    out.extend_from_slice(&usize_word(bytes.len()));
    out.extend_from_slice(bytes);
    out.resize(WORD + padded, 0);
    out
}

pub(crate) fn u256_word(value: &U256) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    value.to_big_endian(&mut word);
    word
}

fn usize_word(value: usize) -> [u8; WORD] {
    u256_word(&U256::from(value))
}
