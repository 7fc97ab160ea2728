//! # Fee strategy
//!
//! How the producer gets paid is chain policy, not coordination logic. The
//! assembler hands the collected fees and the next sequence to whatever
//! implements [`FeeStrategy`] and embeds the returned reward transaction in
//! the candidate. [`FlatSubsidy`] is the reference strategy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::block::types::transaction::{FeeAmount, Transaction};
use crate::utilities::crypto::MinerAccount;
use crate::utilities::encoding;

#[async_trait]
pub trait FeeStrategy: Send + Sync {
    /// Build the reward transaction for a block paying `total_fees` at
    /// `sequence`, spendable by the miner account.
    async fn reward_transaction(
        &self,
        total_fees: FeeAmount,
        sequence: u64,
        miner: &MinerAccount,
    ) -> anyhow::Result<Transaction>;
}

/// Reward = collected fees plus a fixed subsidy, Bitcoin-coinbase style
/// without the halving schedule.
pub struct FlatSubsidy {
    subsidy: FeeAmount,
}

impl FlatSubsidy {
    pub const DEFAULT_SUBSIDY: FeeAmount = 2_000_000_000;

    pub fn new(subsidy: FeeAmount) -> Self {
        Self { subsidy }
    }
}

impl Default for FlatSubsidy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SUBSIDY)
    }
}

/// Payload of the reward transaction.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub(crate) struct RewardNote {
    pub(crate) miner: String,
    pub(crate) amount: FeeAmount,
    pub(crate) sequence: u64,
}

#[async_trait]
impl FeeStrategy for FlatSubsidy {
    async fn reward_transaction(
        &self,
        total_fees: FeeAmount,
        sequence: u64,
        miner: &MinerAccount,
    ) -> anyhow::Result<Transaction> {
        let amount = total_fees
            .checked_add(self.subsidy)
            .ok_or_else(|| anyhow::anyhow!("Reward amount overflows"))?;
        let note = RewardNote {
            miner: miner.name.clone(),
            amount,
            sequence,
        };
        //Rewards mint new funds: no fee, no spent inputs
        Ok(Transaction::new(0, vec![], encoding::encode(&note)?))
    }
}
