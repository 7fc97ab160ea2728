use std::sync::Arc;

use thiserror::Error;

use crate::block::selector::TransactionSelector;
use crate::block::types::block::BlockHash;
use crate::block::types::transaction::{FeeAmount, Transaction};
use crate::chain::{Chain, ChainError};
use crate::fees::FeeStrategy;
use crate::pool::TransactionPool;
use crate::utilities::crypto::MinerAccount;

pub(crate) type Result<T> = std::result::Result<T, AssemblyError>;

#[derive(Error, Debug)]
pub(crate) enum AssemblyError {
    #[error("Miner account is not configured")]
    MinerAccountNotConfigured,
    #[error("Parent block is not on the chain: {0}")]
    MissingParent(BlockHash),
    #[error("Transaction fees overflow")]
    FeeOverflow,
    #[error("Reward transaction failed: {0}")]
    Reward(anyhow::Error),
    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Everything one construction cycle needs to (re-)dispatch a candidate.
/// The retry loop re-uses the same work verbatim; only the chain-computed
/// target changes between dispatches.
#[derive(Debug, Clone)]
pub(crate) struct BlockWork {
    pub(crate) parent: BlockHash,
    pub(crate) sequence: u64,
    pub(crate) reward: Transaction,
    pub(crate) transactions: Vec<Transaction>,
}

/// Builds the transaction set and reward for one candidate block.
#[derive(Clone)]
pub(crate) struct BlockAssembler {
    chain: Arc<dyn Chain>,
    pool: Arc<dyn TransactionPool>,
    fees: Arc<dyn FeeStrategy>,
    miner: Option<MinerAccount>,
    max_transactions: usize,
}

impl BlockAssembler {
    pub(crate) fn new(
        chain: Arc<dyn Chain>,
        pool: Arc<dyn TransactionPool>,
        fees: Arc<dyn FeeStrategy>,
        miner: Option<MinerAccount>,
        max_transactions: usize,
    ) -> Self {
        Self {
            chain,
            pool,
            fees,
            miner,
            max_transactions,
        }
    }

    pub(crate) async fn assemble(&self, parent: &BlockHash) -> Result<BlockWork> {
        let miner = self
            .miner
            .as_ref()
            .ok_or(AssemblyError::MinerAccountNotConfigured)?;

        let mut selector = TransactionSelector::new(self.chain.as_ref(), self.pool.pending());
        let mut transactions = Vec::with_capacity(self.max_transactions);
        while transactions.len() < self.max_transactions {
            match selector.next_eligible().await? {
                Some(transaction) => transactions.push(transaction),
                None => break,
            }
        }

        let mut total_fees: FeeAmount = 0;
        for transaction in &transactions {
            total_fees = total_fees
                .checked_add(transaction.fee)
                .ok_or(AssemblyError::FeeOverflow)?;
        }

        let parent_header = self
            .chain
            .header(parent)
            .await?
            .ok_or(AssemblyError::MissingParent(*parent))?;
        let sequence = parent_header.sequence + 1;

        let reward = self
            .fees
            .reward_transaction(total_fees, sequence, miner)
            .await
            .map_err(AssemblyError::Reward)?;

        log::debug!(
            "Assembled work with {} transactions for sequence {sequence}",
            transactions.len()
        );
        Ok(BlockWork {
            parent: *parent,
            sequence,
            reward,
            transactions,
        })
    }
}
