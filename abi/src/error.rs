pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("expected {expected} arguments, got {found}")]
    ArgumentCount { expected: usize, found: usize },

    #[error("argument {index} has type {found}, expected {expected}")]
    TypeMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("value does not fit in {ty}")]
    ValueOutOfRange { ty: String },

    #[error("not enough data to read a word at offset {offset}, buffer is {len} bytes")]
    InsufficientData { offset: usize, len: usize },

    #[error("offset {offset} points outside of the {len} byte buffer")]
    OffsetOutOfBounds { offset: String, len: usize },

    #[error("invalid utf-8 string")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    #[error("decode hex error")]
    FromHex(#[from] hex::FromHexError),
}
