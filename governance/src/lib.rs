#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Client for the on-chain governance contracts: proposing, voting and reading
//! proposals back.
//!
//! A write is signed locally, broadcast once and then followed with a bounded
//! receipt poll. Network access and signing sit behind traits.

mod error;
pub mod gas;
mod govern;
pub mod poll;
pub mod proposal;
pub mod rpc;
pub mod signer;
pub mod submit;

#[cfg(test)]
mod testing;

pub use error::{GovernError, Result};
pub use gas::{FeePolicy, StaticFeePolicy};
pub use govern::{Govern, GovernConfig, TxKind, VoteRevision};
pub use poll::{PollConfig, ReceiptPoller, Sleeper, TokioSleeper};
pub use proposal::{
    Candidate, ContractRegistry, CouncilExtra, Proposal, ProposalExtra, ProposalRequest,
    ProposalType, ProposeReceipt, WhitelistExtra, WhitelistProvider, GOVERNANCE_CONTRACT,
};
pub use rpc::{http::HttpRpc, NodeRpc};
pub use signer::{LocalSigner, Signer};
