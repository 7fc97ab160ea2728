use std::fmt::{Debug, Display};

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::block::types::transaction::{Nullifier, Transaction};
use crate::utilities;
use crate::utilities::encoding::{Decode, Encode};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct BlockHash([u8; 32]);

impl BlockHash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn zero() -> Self {
        Self([0; 32])
    }

    pub fn inner(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Display for BlockHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", utilities::encoding::to_hex(self.0))
    }
}

impl Debug for BlockHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", utilities::encoding::to_hex(self.0))
    }
}

/// Proof-of-work threshold. A block solves its candidate when the work hash,
/// read as a big-endian integer, is at most the target. Higher targets are
/// easier; [`Target::MAX`] is the easiest value the chain permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub struct Target(U256);

impl Target {
    pub const MAX: Target = Target(U256::MAX);

    pub fn new(value: U256) -> Self {
        Self(value)
    }

    pub fn value(&self) -> U256 {
        self.0
    }

    pub fn meets(&self, hash: &BlockHash) -> bool {
        U256::from_big_endian(hash.inner()) <= self.0
    }

    /// difficulty = 2^256 / (target + 1), saturated at both edges since
    /// neither 2^256 nor division by zero fits in a `U256`.
    pub fn difficulty(&self) -> U256 {
        if self.0 == U256::MAX {
            return U256::one();
        }
        if self.0.is_zero() {
            return U256::MAX;
        }
        let divisor = self.0 + U256::one();
        let quotient = U256::MAX / divisor;
        if U256::MAX % divisor == self.0 {
            quotient + U256::one()
        } else {
            quotient
        }
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Header of a solved block.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BlockHeader {
    pub previous_block_hash: BlockHash,
    pub sequence: u64,
    pub timestamp: u64,
    pub graffiti: String,
    pub transactions_hash: BlockHash,
    pub target: Target,
    pub randomness: u64,
}

impl BlockHeader {
    pub fn hash(&self) -> anyhow::Result<BlockHash> {
        let bytes = self.encode()?;
        Ok(BlockHash::new(utilities::hash::blake2_256(&bytes)))
    }
}

impl Display for BlockHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parent = &self.previous_block_hash;
        let sequence = self.sequence;
        let time = self.timestamp;
        write!(
            f,
            "parent: {parent}, sequence: {sequence}, timestamp: {time}",
        )
    }
}

impl Encode for BlockHeader {
    fn encode(&self) -> anyhow::Result<Vec<u8>> {
        utilities::encoding::encode(self)
    }
}

/// Header of a candidate still missing its randomness.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PartialHeader {
    pub previous_block_hash: BlockHash,
    pub sequence: u64,
    pub timestamp: u64,
    pub graffiti: String,
    pub transactions_hash: BlockHash,
    pub target: Target,
}

/// The part of a header workers grind on. Excludes the randomness, which the
/// worker chooses, and the numeric target, which travels next to the bytes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub(crate) struct WorkHeader {
    pub(crate) previous_block_hash: BlockHash,
    pub(crate) sequence: u64,
    pub(crate) timestamp: u64,
    pub(crate) graffiti: String,
    pub(crate) transactions_hash: BlockHash,
}

impl From<&PartialHeader> for WorkHeader {
    fn from(header: &PartialHeader) -> Self {
        Self {
            previous_block_hash: header.previous_block_hash,
            sequence: header.sequence,
            timestamp: header.timestamp,
            graffiti: header.graffiti.clone(),
            transactions_hash: header.transactions_hash,
        }
    }
}

impl From<&BlockHeader> for WorkHeader {
    fn from(header: &BlockHeader) -> Self {
        Self {
            previous_block_hash: header.previous_block_hash,
            sequence: header.sequence,
            timestamp: header.timestamp,
            graffiti: header.graffiti.clone(),
            transactions_hash: header.transactions_hash,
        }
    }
}

impl Encode for WorkHeader {
    fn encode(&self) -> anyhow::Result<Vec<u8>> {
        utilities::encoding::encode(self)
    }
}

impl Decode for WorkHeader {
    fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        utilities::encoding::decode(bytes)
    }
}

/// An assembled block waiting for a proof. Immutable once dispatched; the
/// only way to set the randomness is [`CandidateBlock::seal`], which consumes
/// the candidate.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CandidateBlock {
    pub(crate) header: PartialHeader,
    pub(crate) reward: Transaction,
    pub(crate) transactions: Vec<Transaction>,
}

impl CandidateBlock {
    pub fn new(header: PartialHeader, reward: Transaction, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            reward,
            transactions,
        }
    }

    pub fn parent_hash(&self) -> BlockHash {
        self.header.previous_block_hash
    }

    pub fn sequence(&self) -> u64 {
        self.header.sequence
    }

    pub fn target(&self) -> Target {
        self.header.target
    }

    /// Bytes handed to workers, without the randomness and the numeric target.
    pub fn work_bytes(&self) -> anyhow::Result<Vec<u8>> {
        WorkHeader::from(&self.header).encode()
    }

    /// Seal the candidate with an externally found randomness. Consuming
    /// `self` makes setting the randomness a one-shot operation.
    pub fn seal(self, randomness: u64) -> Block {
        let header = BlockHeader {
            previous_block_hash: self.header.previous_block_hash,
            sequence: self.header.sequence,
            timestamp: self.header.timestamp,
            graffiti: self.header.graffiti,
            transactions_hash: self.header.transactions_hash,
            target: self.header.target,
            randomness,
        };
        Block {
            header,
            reward: self.reward,
            transactions: self.transactions,
        }
    }
}

impl Display for CandidateBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parent = &self.header.previous_block_hash;
        let sequence = self.header.sequence;
        write!(
            f,
            "parent: {parent}, sequence: {sequence}, nr of transactions: {}",
            self.transactions.len()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Block {
    pub header: BlockHeader,
    pub reward: Transaction,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn hash(&self) -> anyhow::Result<BlockHash> {
        self.header.hash()
    }

    /// Nullifiers claimed by the block's transactions. The reward spends
    /// nothing and claims none.
    pub fn spent_nullifiers(&self) -> impl Iterator<Item = &Nullifier> {
        self.transactions.iter().flat_map(|tx| tx.nullifiers.iter())
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header = &self.header;
        write!(f, "{header}, nr of transactions: {}", self.transactions.len())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn candidate(target: Target) -> CandidateBlock {
        let header = PartialHeader {
            previous_block_hash: BlockHash::new([1; 32]),
            sequence: 7,
            timestamp: 1000,
            graffiti: "test".to_string(),
            transactions_hash: BlockHash::new([2; 32]),
            target,
        };
        CandidateBlock::new(header, Transaction::new(0, vec![], vec![]), vec![])
    }

    #[test]
    fn test_seal_sets_randomness_and_keeps_header() {
        let candidate = candidate(Target::MAX);
        let header = candidate.header.clone();

        let block = candidate.seal(42);

        assert_eq!(block.header.randomness, 42);
        assert_eq!(block.header.previous_block_hash, header.previous_block_hash);
        assert_eq!(block.header.sequence, header.sequence);
        assert_eq!(block.header.target, header.target);
    }

    #[test]
    fn test_work_bytes_exclude_randomness_and_target() {
        let easy = candidate(Target::MAX);
        let hard = candidate(Target::new(U256::one()));

        //Candidates differing only in target grind on identical bytes
        assert_eq!(easy.work_bytes().unwrap(), hard.work_bytes().unwrap());

        let sealed = easy.clone().seal(99);
        let work = WorkHeader::from(&sealed.header).encode().unwrap();
        assert_eq!(work, easy.work_bytes().unwrap());
    }

    #[test]
    fn test_max_target_meets_any_hash() {
        assert!(Target::MAX.meets(&BlockHash::new([0xff; 32])));
        assert!(Target::MAX.meets(&BlockHash::zero()));
    }

    #[test]
    fn test_small_target_rejects_large_hash() {
        let target = Target::new(U256::from(u64::MAX));
        assert!(!target.meets(&BlockHash::new([0xff; 32])));
        assert!(target.meets(&BlockHash::zero()));
    }

    #[test]
    fn test_difficulty_at_edges() {
        assert_eq!(Target::MAX.difficulty(), U256::one());
        assert_eq!(Target::new(U256::zero()).difficulty(), U256::MAX);
    }

    #[test]
    fn test_difficulty_halving_target_doubles() {
        // target 2^255 - 1 covers exactly half the hash space
        let half = Target::new((U256::one() << 255) - U256::one());
        assert_eq!(half.difficulty(), U256::from(2));
    }
}
