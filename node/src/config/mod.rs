use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utilities::crypto::{MinerAccount, SpendingKey};

pub const DEFAULT_MAX_BLOCK_TRANSACTIONS: usize = 10;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 10_000;
pub const DEFAULT_CANDIDATE_CACHE_CAPACITY: usize = 50;

const CONFIG_FILE_NAME: &str = "headframe.toml";
const ROOT_DIR_NAME: &str = ".headframe";

pub type Result<T> = std::result::Result<T, ConfigurationError>;

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Failed to read configuration: {0}")]
    Read(#[from] config::ConfigError),
    #[error("Failed to write configuration: {0}")]
    Write(#[from] std::io::Error),
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid miner spending key: {0}")]
    SpendingKey(#[from] crate::utilities::crypto::KeyError),
    #[error("Home directory not found")]
    HomeDirectory,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NodeConfiguration {
    /// Producer tag embedded in every candidate, identification only.
    pub graffiti: String,
    /// Bypass the synchronization precondition and mine immediately.
    #[serde(default)]
    pub force_mine: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MinerConfiguration {
    pub account_name: String,
    /// Base58-encoded spending key.
    pub spending_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MiningConfiguration {
    pub max_block_transactions: usize,
    pub retry_delay_ms: u64,
    pub candidate_cache_capacity: usize,
}

impl Default for MiningConfiguration {
    fn default() -> Self {
        Self {
            max_block_transactions: DEFAULT_MAX_BLOCK_TRANSACTIONS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            candidate_cache_capacity: DEFAULT_CANDIDATE_CACHE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Configuration {
    pub node: NodeConfiguration,
    /// Without a miner account the director runs but every assembly fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miner: Option<MinerConfiguration>,
    #[serde(default)]
    pub mining: MiningConfiguration,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            node: NodeConfiguration {
                graffiti: "headframe".to_string(),
                force_mine: false,
            },
            miner: None,
            mining: MiningConfiguration::default(),
        }
    }
}

impl Configuration {
    pub fn try_load(file: PathBuf) -> Result<Configuration> {
        let config = config::Config::builder()
            .add_source(config::File::from(file))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn try_load_from_home_dir(node_name: &str) -> Result<Configuration> {
        Self::try_load(Self::node_config_file(node_name)?)
    }

    pub fn try_write_home_dir(&self, node_name: &str) -> Result<()> {
        let file = Self::node_config_file(node_name)?;
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml = toml::to_string(self)?;
        std::fs::write(file, toml)?;
        Ok(())
    }

    pub fn root_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(ROOT_DIR_NAME))
            .ok_or(ConfigurationError::HomeDirectory)
    }

    fn node_config_file(node_name: &str) -> Result<PathBuf> {
        Ok(Self::root_dir()?.join(node_name).join(CONFIG_FILE_NAME))
    }

    /// The configured miner identity, if any.
    pub fn miner_account(&self) -> Result<Option<MinerAccount>> {
        match &self.miner {
            Some(miner) => {
                let key = SpendingKey::from_base58(&miner.spending_key)?;
                Ok(Some(MinerAccount::new(miner.account_name.clone(), key)))
            }
            None => Ok(None),
        }
    }
}
