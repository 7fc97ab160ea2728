use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use primitive_types::U256;
use tokio::sync::mpsc::UnboundedSender;

use crate::block::types::block::{
    Block, BlockHash, BlockHeader, CandidateBlock, PartialHeader, Target, WorkHeader,
};
use crate::block::types::transaction::{Nullifier, Transaction};
use crate::chain::{Chain, ChainError, ChainEvent, Result, Verification};
use crate::utilities::encoding::Encode;
use crate::utilities::hash::blake2_256;
use crate::utilities::time::Clock;

/// Expected tries per solve: 2^256 / 2^240 = 2^16, a few milliseconds of
/// hashing on one core.
const DEFAULT_BASE_TARGET_BITS: usize = 240;

const DEFAULT_DECAY_INTERVAL: Duration = Duration::from_secs(10);

const GENESIS_GRAFFITI: &str = "genesis";

/// The proof rule of the in-memory chain: blake2b over the work bytes
/// followed by the little-endian randomness.
pub(crate) fn work_hash(work_bytes: &[u8], randomness: u64) -> BlockHash {
    let mut data = Vec::with_capacity(work_bytes.len() + 8);
    data.extend_from_slice(work_bytes);
    data.extend_from_slice(&randomness.to_le_bytes());
    BlockHash::new(blake2_256(&data))
}

struct ChainState {
    head: Option<BlockHash>,
    synced: bool,
    headers: HashMap<BlockHash, BlockHeader>,
    spent_nullifiers: HashSet<Nullifier>,
}

/// In-memory [`Chain`] implementation backing the `run` command and the
/// tests. Real deployments implement [`Chain`] against their own ledger.
pub struct MemoryChain {
    state: RwLock<ChainState>,
    base_target: Target,
    decay_interval_ms: u64,
    events: UnboundedSender<ChainEvent>,
    //test knobs, normally unset
    forced_invalid: Mutex<Option<String>>,
    forced_append_failure: Mutex<Option<String>>,
}

impl MemoryChain {
    pub fn new(events: UnboundedSender<ChainEvent>) -> Self {
        let base_target = Target::new(U256::one() << DEFAULT_BASE_TARGET_BITS);
        Self::with_base_target(base_target, DEFAULT_DECAY_INTERVAL, events)
    }

    pub fn with_base_target(
        base_target: Target,
        decay_interval: Duration,
        events: UnboundedSender<ChainEvent>,
    ) -> Self {
        let chain = Self {
            state: RwLock::new(ChainState {
                head: None,
                synced: false,
                headers: HashMap::new(),
                spent_nullifiers: HashSet::new(),
            }),
            base_target,
            decay_interval_ms: decay_interval.as_millis().max(1) as u64,
            events,
            forced_invalid: Mutex::new(None),
            forced_append_failure: Mutex::new(None),
        };
        chain.bootstrap_genesis();
        chain
    }

    fn bootstrap_genesis(&self) {
        let header = BlockHeader {
            previous_block_hash: BlockHash::zero(),
            sequence: 1,
            timestamp: Clock::now_millis(),
            graffiti: GENESIS_GRAFFITI.to_string(),
            transactions_hash: BlockHash::zero(),
            target: self.base_target,
            randomness: 0,
        };
        let hash = header.hash().expect("Genesis header must encode");

        let mut state = self.state.write();
        state.headers.insert(hash, header);
        state.head = Some(hash);
        log::debug!("Bootstrapped genesis block: {hash}");
    }

    /// Flip the synced flag. The transition into synced is announced once.
    pub fn set_synced(&self, synced: bool) {
        let became_synced = {
            let mut state = self.state.write();
            let became = synced && !state.synced;
            state.synced = synced;
            became
        };
        if became_synced {
            self.send_event(ChainEvent::Synced);
        }
    }

    /// Seed a spent nullifier without a containing block.
    pub fn mark_spent(&self, nullifier: Nullifier) {
        self.state.write().spent_nullifiers.insert(nullifier);
    }

    /// Make every following verification fail with `reason`.
    pub fn force_invalid(&self, reason: &str) {
        *self.forced_invalid.lock() = Some(reason.to_string());
    }

    /// Make every following append fail with `reason`.
    pub fn force_append_failure(&self, reason: &str) {
        *self.forced_append_failure.lock() = Some(reason.to_string());
    }

    fn send_event(&self, event: ChainEvent) {
        if self.events.send(event).is_err() {
            log::trace!("No chain event listener, dropping {event:?}");
        }
    }

    fn decayed_target(&self, elapsed_ms: u64) -> Target {
        let steps = (elapsed_ms / self.decay_interval_ms).min(256);
        let mut value = self.base_target.value();
        for _ in 0..steps {
            value = value.saturating_mul(U256::from(2));
        }
        Target::new(value)
    }

    fn run_verification(&self, block: &Block) -> anyhow::Result<Option<String>> {
        let parent = {
            let state = self.state.read();
            state
                .headers
                .get(&block.header.previous_block_hash)
                .cloned()
        };
        let Some(parent) = parent else {
            return Ok(Some(format!(
                "unknown parent {}",
                block.header.previous_block_hash
            )));
        };

        if block.header.sequence != parent.sequence + 1 {
            return Ok(Some(format!(
                "sequence {} does not follow parent sequence {}",
                block.header.sequence, parent.sequence
            )));
        }

        let work_bytes = WorkHeader::from(&block.header).encode()?;
        let hash = work_hash(&work_bytes, block.header.randomness);
        if !block.header.target.meets(&hash) {
            return Ok(Some(format!("work hash {hash} misses the target")));
        }

        let state = self.state.read();
        let mut claimed = HashSet::new();
        for nullifier in block.spent_nullifiers() {
            if state.spent_nullifiers.contains(nullifier) {
                return Ok(Some(format!("nullifier {nullifier} is already spent")));
            }
            if !claimed.insert(*nullifier) {
                return Ok(Some(format!("nullifier {nullifier} claimed twice")));
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl Chain for MemoryChain {
    fn head(&self) -> Option<BlockHash> {
        self.state.read().head
    }

    fn is_synced(&self) -> bool {
        self.state.read().synced
    }

    async fn header(&self, hash: &BlockHash) -> Result<Option<BlockHeader>> {
        Ok(self.state.read().headers.get(hash).cloned())
    }

    async fn contains_nullifier(&self, nullifier: &Nullifier) -> Result<bool> {
        Ok(self.state.read().spent_nullifiers.contains(nullifier))
    }

    async fn construct_block(
        &self,
        parent: &BlockHash,
        reward: Transaction,
        transactions: Vec<Transaction>,
        graffiti: &str,
    ) -> Result<CandidateBlock> {
        let parent_header = self
            .state
            .read()
            .headers
            .get(parent)
            .cloned()
            .ok_or(ChainError::UnknownBlock(*parent))?;

        let now = Clock::now_millis();
        let elapsed = now.saturating_sub(parent_header.timestamp);
        let header = PartialHeader {
            previous_block_hash: *parent,
            sequence: parent_header.sequence + 1,
            timestamp: now,
            graffiti: graffiti.to_string(),
            transactions_hash: transactions_hash(&reward, &transactions)?,
            target: self.decayed_target(elapsed),
        };
        Ok(CandidateBlock::new(header, reward, transactions))
    }

    async fn verify(&self, block: &Block) -> Verification {
        if let Some(reason) = self.forced_invalid.lock().clone() {
            return Verification::Invalid(reason);
        }
        match self.run_verification(block) {
            Ok(None) => Verification::Valid,
            Ok(Some(reason)) => Verification::Invalid(reason),
            Err(err) => Verification::Invalid(err.to_string()),
        }
    }

    async fn append(&self, block: Block) -> Result<()> {
        if let Some(reason) = self.forced_append_failure.lock().clone() {
            return Err(ChainError::Rejected(reason));
        }

        let hash = block.hash()?;
        {
            let mut state = self.state.write();
            if state.head != Some(block.header.previous_block_hash) {
                return Err(ChainError::Rejected(format!(
                    "block {hash} does not extend the current head"
                )));
            }
            for nullifier in block.spent_nullifiers() {
                state.spent_nullifiers.insert(*nullifier);
            }
            state.headers.insert(hash, block.header.clone());
            state.head = Some(hash);
        }

        log::debug!("Connected block: {block}");
        self.send_event(ChainEvent::HeadConnected(hash));
        Ok(())
    }
}

fn transactions_hash(reward: &Transaction, transactions: &[Transaction]) -> anyhow::Result<BlockHash> {
    let mut data = reward.encode()?;
    for tx in transactions {
        data.extend(tx.encode()?);
    }
    Ok(BlockHash::new(blake2_256(&data)))
}
