use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::chain::{Chain, Verification};
use crate::director::cache::CandidateCache;
use crate::director::{MinedResult, MiningRequestId};
use crate::events::BlockBroadcast;
use crate::metrics;

/// Reconciles externally found solutions against the live chain. Runs on
/// spawned tasks, so completions interleave with construction and with each
/// other; the cache's atomic take is what keeps duplicates out.
pub(crate) struct ResultReconciler {
    chain: Arc<dyn Chain>,
    candidates: Arc<CandidateCache>,
    block_broadcast: BlockBroadcast,
    blocks_mined: Arc<AtomicU64>,
}

impl ResultReconciler {
    pub(crate) fn new(
        chain: Arc<dyn Chain>,
        candidates: Arc<CandidateCache>,
        block_broadcast: BlockBroadcast,
        blocks_mined: Arc<AtomicU64>,
    ) -> Self {
        Self {
            chain,
            candidates,
            block_broadcast,
            blocks_mined,
        }
    }

    /// A worker claims to have solved the candidate dispatched under
    /// `request_id`. Every path out of here is a terminal [`MinedResult`];
    /// reconciliation never errors.
    pub(crate) async fn successfully_mined(
        &self,
        randomness: u64,
        request_id: MiningRequestId,
    ) -> MinedResult {
        let Some(candidate) = self.candidates.take(request_id) else {
            log::debug!("Solution for unknown mining request: {request_id}");
            return MinedResult::UnknownRequest;
        };

        match self.chain.head() {
            Some(head) if head == candidate.parent_hash() => {}
            _ => {
                log::info!(
                    "Discarding stale solution for request {request_id}, chain moved past {}",
                    candidate.parent_hash()
                );
                return MinedResult::ChainChanged;
            }
        }

        let block = candidate.seal(randomness);
        if let Verification::Invalid(reason) = self.chain.verify(&block).await {
            log::warn!("Mined block failed verification: {reason}");
            return MinedResult::InvalidBlock;
        }

        let sequence = block.header.sequence;
        let difficulty = block.header.target.difficulty();
        if let Err(err) = self.chain.append(block.clone()).await {
            log::error!("Chain refused mined block at sequence {sequence}: {err}");
            return MinedResult::AddFailed;
        }

        self.blocks_mined.fetch_add(1, Ordering::Relaxed);
        if let Err(err) = self.block_broadcast.send_block(&block) {
            log::trace!("No listeners for mined block broadcast: {err:?}");
        }
        metrics::mined_block(difficulty, sequence);
        log::info!("Mined block connected at sequence {sequence}");
        MinedResult::Success
    }
}
