use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};

use crate::utilities;
use crate::utilities::encoding::{Decode, Encode};

/// Fees are expressed in the smallest denomination of the chain's asset.
pub type FeeAmount = u64;

/// Marks an input as spent. A nullifier appearing twice is a double spend,
/// whether the two appearances are in one block or across the chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Nullifier([u8; 32]);

impl Nullifier {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn inner(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Display for Nullifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", utilities::encoding::to_hex(self.0))
    }
}

impl Debug for Nullifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", utilities::encoding::to_hex(self.0))
    }
}

/// A pending or included transaction. The director treats the payload as
/// opaque; it only reads fees and the claimed nullifiers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Transaction {
    pub fee: FeeAmount,
    pub nullifiers: Vec<Nullifier>,
    ///Application specific data
    pub data: Vec<u8>,
}

impl Transaction {
    pub fn new(fee: FeeAmount, nullifiers: Vec<Nullifier>, data: Vec<u8>) -> Self {
        Self {
            fee,
            nullifiers,
            data,
        }
    }
}

impl Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fee = self.fee;
        write!(f, "fee: {fee}, nullifiers: {}", self.nullifiers.len())
    }
}

impl Encode for Transaction {
    fn encode(&self) -> anyhow::Result<Vec<u8>> {
        utilities::encoding::encode(self)
    }
}

impl Decode for Transaction {
    fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        utilities::encoding::decode(bytes)
    }
}
