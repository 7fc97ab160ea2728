use clap::Parser;

use crate::config::{
    Configuration, MinerConfiguration, MiningConfiguration, NodeConfiguration,
    DEFAULT_CANDIDATE_CACHE_CAPACITY, DEFAULT_MAX_BLOCK_TRANSACTIONS, DEFAULT_RETRY_DELAY_MS,
};
use crate::utilities::crypto::SpendingKey;

#[derive(Debug, Clone, Parser)]
pub struct InitCmd {
    #[arg(long, default_value = "default")]
    pub node_name: String,
    #[arg(long, default_value = "headframe")]
    pub graffiti: String,
    /// Mine without waiting for the chain to report itself synchronized.
    #[arg(long)]
    pub force_mine: bool,
    #[arg(long, default_value = "miner")]
    pub miner_account: String,
    #[arg(long, default_value_t = DEFAULT_MAX_BLOCK_TRANSACTIONS)]
    pub max_block_transactions: usize,
    #[arg(long, default_value_t = DEFAULT_RETRY_DELAY_MS)]
    pub retry_delay_ms: u64,
}

impl InitCmd {
    /// # Panics
    /// Panics if the config file already exists.
    pub fn execute(self) -> anyhow::Result<()> {
        assert!(
            Configuration::try_load_from_home_dir(&self.node_name).is_err(),
            "Configuration file already exists: {}",
            self.node_name
        );

        let path = Configuration::root_dir()?.join(&self.node_name);
        println!("Creating headframe node configuration in: {path:?}");
        println!("Configuration: {self:?}");

        let spending_key = SpendingKey::generate();

        let configuration = Configuration {
            node: NodeConfiguration {
                graffiti: self.graffiti,
                force_mine: self.force_mine,
            },
            miner: Some(MinerConfiguration {
                account_name: self.miner_account,
                spending_key: spending_key.to_base58(),
            }),
            mining: MiningConfiguration {
                max_block_transactions: self.max_block_transactions,
                retry_delay_ms: self.retry_delay_ms,
                candidate_cache_capacity: DEFAULT_CANDIDATE_CACHE_CAPACITY,
            },
        };
        if let Err(err) = configuration.try_write_home_dir(&self.node_name) {
            eprintln!("Error creating configuration file: {err:?}");
        }
        Ok(())
    }
}
