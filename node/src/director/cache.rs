use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

use crate::block::types::block::CandidateBlock;
use crate::director::MiningRequestId;

/// Dispatched-but-unsolved candidates keyed by request id. Bounded; when
/// full, the least recently touched candidate is evicted and any late
/// solution for it reconciles as an unknown request.
pub(crate) struct CandidateCache {
    candidates: Mutex<LruCache<MiningRequestId, CandidateBlock>>,
}

impl CandidateCache {
    pub(crate) fn new(capacity: NonZeroUsize) -> Self {
        Self {
            candidates: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub(crate) fn insert(&self, request_id: MiningRequestId, candidate: CandidateBlock) {
        self.candidates.lock().put(request_id, candidate);
    }

    /// Atomic lookup-and-remove. Two completions racing on the same request
    /// id cannot both get the candidate; the second sees `None`.
    pub(crate) fn take(&self, request_id: MiningRequestId) -> Option<CandidateBlock> {
        self.candidates.lock().pop(&request_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.candidates.lock().len()
    }
}
