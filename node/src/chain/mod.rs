//! # Chain collaborator
//!
//! The director never owns chain state. It drives block production against
//! whatever implements [`Chain`]: the canonical head, header lookups, the
//! spent-nullifier ledger, candidate construction and final verification all
//! belong to the chain. [`MemoryChain`] is the in-process implementation used
//! by the `run-node` command and the tests.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::block::types::block::{Block, BlockHash, BlockHeader, CandidateBlock};
use crate::block::types::transaction::{Nullifier, Transaction};

pub mod memory;

pub use memory::MemoryChain;

pub type Result<T> = std::result::Result<T, ChainError>;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Block is not on the chain: {0}")]
    UnknownBlock(BlockHash),
    #[error("Chain rejected block: {0}")]
    Rejected(String),
    #[error("ChainError::General: {0}")]
    General(#[from] anyhow::Error),
}

/// Verdict of consensus verification. The rules themselves are the chain's
/// business; the director only needs valid-or-not plus a loggable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid,
    Invalid(String),
}

/// Chain-side notifications the director reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainEvent {
    /// A block was connected and is the new canonical head.
    HeadConnected(BlockHash),
    /// The chain considers itself synchronized with the network.
    Synced,
}

pub fn event_channel() -> (
    mpsc::UnboundedSender<ChainEvent>,
    mpsc::UnboundedReceiver<ChainEvent>,
) {
    mpsc::unbounded_channel()
}

#[async_trait]
pub trait Chain: Send + Sync {
    /// Hash of the canonical head, if the chain has one.
    fn head(&self) -> Option<BlockHash>;

    /// Whether the chain believes it has caught up with the network.
    fn is_synced(&self) -> bool;

    async fn header(&self, hash: &BlockHash) -> Result<Option<BlockHeader>>;

    /// Whether the nullifier is already spent on the canonical chain.
    async fn contains_nullifier(&self, nullifier: &Nullifier) -> Result<bool>;

    /// Build an unsolved candidate on top of `parent`. The chain picks the
    /// timestamp and recomputes the target from the time elapsed since the
    /// parent, so calling again later yields an easier target.
    async fn construct_block(
        &self,
        parent: &BlockHash,
        reward: Transaction,
        transactions: Vec<Transaction>,
        graffiti: &str,
    ) -> Result<CandidateBlock>;

    /// Run full consensus verification on a sealed block.
    async fn verify(&self, block: &Block) -> Verification;

    /// Connect a verified block to the chain. [`ChainError::Rejected`]
    /// carries the chain's reason when it refuses.
    async fn append(&self, block: Block) -> Result<()>;
}
