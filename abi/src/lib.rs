#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Contract ABI codec: call payload encoding and return data decoding for the
//! standard head/tail layout.

mod address;
mod decode;
mod encode;
mod error;
mod function;
mod hash;
mod token;

pub use address::Address;
pub use decode::decode;
pub use encode::encode;
pub use error::{Error, Result};
pub use function::{selector, Function};
pub use hash::keccak256;
pub use token::{int_to_i128, ParamType, Token};

#[allow(clippy::assign_op_pattern)]
mod u256 {
    use uint::construct_uint;

    construct_uint! {
        /// 256-bit unsigned integer.
        pub struct U256(4);
    }
}

pub use u256::U256;

/// Size of a single ABI word.
pub const WORD: usize = 32;
