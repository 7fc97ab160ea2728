use std::fmt::{Debug, Display};

use rand::RngCore;
use thiserror::Error;

use crate::utilities::encoding;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid base58")]
    InvalidBase58,
    #[error("Invalid key length")]
    SliceLength,
}

/// Key authorizing the reward transaction of a produced block.
///
/// Key management proper lives outside this crate. The director only carries
/// the key material from configuration to the fee strategy.
#[derive(Clone, PartialEq, Eq)]
pub struct SpendingKey([u8; 32]);

impl SpendingKey {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn to_base58(&self) -> String {
        encoding::to_base58(self.0)
    }

    pub fn from_base58(key: &str) -> Result<Self, KeyError> {
        let bytes = encoding::from_base58(key).map_err(|_| KeyError::InvalidBase58)?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| KeyError::SliceLength)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

//Key material stays out of logs
impl Debug for SpendingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SpendingKey(..)")
    }
}

/// The identity blocks are produced for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinerAccount {
    pub name: String,
    pub spending_key: SpendingKey,
}

impl MinerAccount {
    pub fn new(name: String, spending_key: SpendingKey) -> Self {
        Self { name, spending_key }
    }
}

impl Display for MinerAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
