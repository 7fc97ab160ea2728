use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::api::DirectorApi;
use crate::block::assembler::BlockAssembler;
use crate::chain::{Chain, ChainEvent};
use crate::config::Configuration;
use crate::core::shutdown;
use crate::director::Director;
use crate::events::{BlockBroadcast, MiningJobDispatcher};
use crate::fees::FeeStrategy;
use crate::pool::TransactionPool;

#[derive(Error, Debug)]
pub enum BuilderError {
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(&'static str),
    #[error(transparent)]
    Configuration(#[from] crate::config::ConfigurationError),
}

/// Everything external code needs to talk to a running [`Director`].
#[derive(Clone)]
pub struct DirectorHandle {
    /// Command channel: start, submit solutions, query status.
    pub api: DirectorApi,
    pub shutdown: shutdown::Handle,
    /// Register proof-of-work workers here.
    pub mining_jobs: Arc<MiningJobDispatcher>,
    /// Fire-and-forget announcements of freshly mined blocks.
    pub mined_blocks: BlockBroadcast,
}

/// Wires the collaborators and configuration into a [`Director`]. Pure data
/// plumbing; nothing runs until [`Director::run`] is awaited.
pub struct DirectorBuilder {
    config: Configuration,
    chain: Option<Arc<dyn Chain>>,
    chain_events: Option<UnboundedReceiver<ChainEvent>>,
    pool: Option<Arc<dyn TransactionPool>>,
    fees: Option<Arc<dyn FeeStrategy>>,
}

impl DirectorBuilder {
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            chain: None,
            chain_events: None,
            pool: None,
            fees: None,
        }
    }

    pub fn with_chain(self, chain: Arc<dyn Chain>) -> Self {
        Self {
            chain: Some(chain),
            ..self
        }
    }

    pub fn with_chain_events(self, chain_events: UnboundedReceiver<ChainEvent>) -> Self {
        Self {
            chain_events: Some(chain_events),
            ..self
        }
    }

    pub fn with_pool(self, pool: Arc<dyn TransactionPool>) -> Self {
        Self {
            pool: Some(pool),
            ..self
        }
    }

    pub fn with_fee_strategy(self, fees: Arc<dyn FeeStrategy>) -> Self {
        Self {
            fees: Some(fees),
            ..self
        }
    }

    pub fn build(self) -> Result<(Director, DirectorHandle), BuilderError> {
        let chain = self
            .chain
            .ok_or(BuilderError::MissingCollaborator("chain"))?;
        let chain_events = self
            .chain_events
            .ok_or(BuilderError::MissingCollaborator("chain events"))?;
        let pool = self.pool.ok_or(BuilderError::MissingCollaborator("pool"))?;
        let fees = self
            .fees
            .ok_or(BuilderError::MissingCollaborator("fee strategy"))?;

        let miner = self.config.miner_account()?;
        let assembler = BlockAssembler::new(
            chain.clone(),
            pool,
            fees,
            miner,
            self.config.mining.max_block_transactions,
        );

        let mining_jobs = Arc::new(MiningJobDispatcher::new());
        let mined_blocks = BlockBroadcast::new();
        let (api, api_listener) = DirectorApi::new();
        let (shutdown_handle, external_shutdown) = shutdown::channel();

        let director = Director::new(
            &self.config.mining,
            self.config.node.force_mine,
            self.config.node.graffiti.clone(),
            chain,
            chain_events,
            assembler,
            mining_jobs.clone(),
            mined_blocks.clone(),
            api_listener,
            external_shutdown,
        );
        let handle = DirectorHandle {
            api,
            shutdown: shutdown_handle,
            mining_jobs,
            mined_blocks,
        };
        Ok((director, handle))
    }
}

#[cfg(test)]
mod test {
    use crate::chain::{event_channel, MemoryChain};
    use crate::fees::FlatSubsidy;
    use crate::pool::MemoryPool;

    use super::*;

    #[test]
    fn test_build_requires_all_collaborators() {
        let result = DirectorBuilder::new(Configuration::default()).build();
        assert!(matches!(
            result,
            Err(BuilderError::MissingCollaborator("chain"))
        ));
    }

    #[test]
    fn test_build_with_all_collaborators() {
        let (events_tx, events_rx) = event_channel();
        let chain = Arc::new(MemoryChain::new(events_tx));

        let result = DirectorBuilder::new(Configuration::default())
            .with_chain(chain)
            .with_chain_events(events_rx)
            .with_pool(Arc::new(MemoryPool::new()))
            .with_fee_strategy(Arc::new(FlatSubsidy::default()))
            .build();

        assert!(result.is_ok());
    }
}
