//! Bounded receipt polling.

use crate::rpc::{self, NodeRpc, Receipt};
use std::time::Duration;
use tracing::{debug, warn};
use transaction::TxHash;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Number of receipt queries before giving up
    pub max_attempts: u32,
    /// Delay between two queries
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// `attempts` queries have returned no receipt so far
    Pending { attempts: u32 },
    Confirmed(Receipt),
    Failed(Receipt),
    /// Budget exhausted, the transaction may still be included later
    TimedOut,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Pending { .. })
    }
}

pub struct ReceiptPoller<'a> {
    rpc: &'a dyn NodeRpc,
    sleeper: &'a dyn Sleeper,
    config: PollConfig,
}

impl<'a> ReceiptPoller<'a> {
    pub fn new(rpc: &'a dyn NodeRpc, sleeper: &'a dyn Sleeper, config: PollConfig) -> Self {
        Self {
            rpc,
            sleeper,
            config,
        }
    }

    /// Polls until a terminal state. Transport errors end the poll immediately.
    pub async fn poll(&self, tx_hash: &TxHash) -> rpc::Result<PollState> {
        let mut state = PollState::Pending { attempts: 0 };
        while !state.is_terminal() {
            state = self.step(tx_hash, state).await?;
        }
        Ok(state)
    }

    async fn step(&self, tx_hash: &TxHash, state: PollState) -> rpc::Result<PollState> {
        let attempts = match state {
            PollState::Pending { attempts } => attempts,
            terminal => return Ok(terminal),
        };

        if attempts >= self.config.max_attempts {
            warn!(%tx_hash, attempts, "receipt not generated");
            return Ok(PollState::TimedOut);
        }

        if attempts > 0 {
            self.sleeper.sleep(self.config.interval).await;
        }

        let receipt = self.rpc.get_transaction_receipt(tx_hash).await?;
        debug!(%tx_hash, attempt = attempts + 1, found = receipt.is_some(), "polled receipt");

        Ok(match receipt {
            None => PollState::Pending {
                attempts: attempts + 1,
            },
            Some(receipt) if receipt.is_success() => PollState::Confirmed(receipt),
            Some(receipt) => PollState::Failed(receipt),
        })
    }
}
