//! # Event surfaces
//!
//! Two publication primitives with deliberately different contracts:
//! [`MiningJobDispatcher`] hands new work to registered subscribers and waits
//! until every one of them has taken it, so a job is either with the workers
//! or it failed before the candidate was cached. [`BlockBroadcast`] announces
//! freshly mined blocks without waiting; a slow listener never stalls
//! reconciliation.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::block::types::block::{Block, Target};
use crate::director::MiningRequestId;
use crate::logging;

/// Work order published to proof-of-work workers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MiningJob {
    pub request_id: MiningRequestId,
    /// Serialized header without the randomness and the numeric target.
    pub header_bytes: Vec<u8>,
    pub target: Target,
    pub sequence: u64,
}

#[async_trait]
pub trait MiningJobSubscriber: Send + Sync {
    async fn on_mining_job(&self, job: &MiningJob);
}

pub struct MiningJobDispatcher {
    subscribers: RwLock<Vec<Arc<dyn MiningJobSubscriber>>>,
}

impl MiningJobDispatcher {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, subscriber: Arc<dyn MiningJobSubscriber>) {
        self.subscribers.write().push(subscriber);
    }

    /// Publish a job and wait until all currently registered subscribers
    /// have handled it. Subscribers registered mid-publish see the next job.
    pub(crate) async fn publish(&self, job: &MiningJob) {
        let subscribers = self.subscribers.read().clone();
        log::debug!("Publishing mining job: {}", logging::pretty_json(job));
        join_all(
            subscribers
                .iter()
                .map(|subscriber| subscriber.on_mining_job(job)),
        )
        .await;
    }
}

/// Fire-and-forget announcement of mined blocks (new block out, nobody has
/// to be listening).
#[derive(Clone)]
pub struct BlockBroadcast {
    mined_blocks_tx: broadcast::Sender<Block>,
}

impl BlockBroadcast {
    pub(crate) fn new() -> Self {
        let (mined_blocks_tx, _) = broadcast::channel(1000);
        Self { mined_blocks_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Block> {
        self.mined_blocks_tx.subscribe()
    }

    pub(crate) fn send_block(&self, block: &Block) -> anyhow::Result<()> {
        log::debug!("Broadcasting mined block: {block}");
        self.mined_blocks_tx.send(block.clone())?;
        Ok(())
    }
}
