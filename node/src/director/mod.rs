//! # Director
//!
//! Top-level orchestrator of block production. The director reacts to
//! chain-head changes, assembles a candidate for the newest head, dispatches
//! it to external proof-of-work workers and re-dispatches with an eased
//! target on a timer until a solution arrives or the head moves on.
//!
//! Everything runs inside one `tokio::select!` loop. Head changes arriving
//! mid-construction never interrupt the suspended work; they only overwrite
//! the coalescing next-head slot, which the loop consults when the in-flight
//! work completes. That single slot is what turns a burst of notifications
//! into at most one in-flight construction plus one pending follow-up.

use std::num::NonZeroUsize;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::Poll::{Pending, Ready};
use std::{task, time};

use futures::future::BoxFuture;
use futures::{FutureExt, Stream};
use futures_timer::Delay;
use futures_util::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::api::{ApiCmd, ApiListener};
use crate::block::assembler::{AssemblyError, BlockAssembler, BlockWork};
use crate::block::types::block::{BlockHash, Target};
use crate::chain::{Chain, ChainError, ChainEvent};
use crate::config::MiningConfiguration;
use crate::director::cache::CandidateCache;
use crate::director::reconciler::ResultReconciler;
use crate::events::{BlockBroadcast, MiningJob, MiningJobDispatcher};

pub(crate) mod cache;
pub(crate) mod reconciler;

/// Identifies one dispatched candidate. Strictly increasing per director
/// instance, never reused.
pub type MiningRequestId = u64;

/// Terminal outcome of reconciling one reported solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinedResult {
    /// The request id is unrecognized, already consumed or evicted.
    UnknownRequest,
    /// The chain moved past the candidate's parent before the solution came.
    ChainChanged,
    /// Consensus verification rejected the sealed block.
    InvalidBlock,
    /// The chain refused to append the verified block.
    AddFailed,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Started,
    Stopped,
}

#[derive(Error, Debug)]
enum DispatchError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("Failed to encode work bytes: {0}")]
    Encoding(#[from] anyhow::Error),
}

/// What one assemble-and-dispatch iteration reports back to the loop.
enum CycleOutcome {
    Dispatched {
        work: BlockWork,
        /// False once the dispatched target hit the easiest permitted value.
        retry_possible: bool,
    },
    Failed,
}

/// Shared by the construction futures. Cloning is cheap, everything heavy
/// sits behind an `Arc`.
#[derive(Clone)]
struct DispatchPipeline {
    chain: Arc<dyn Chain>,
    assembler: BlockAssembler,
    mining_jobs: Arc<MiningJobDispatcher>,
    candidates: Arc<CandidateCache>,
    request_ids: Arc<AtomicU64>,
    graffiti: String,
}

impl DispatchPipeline {
    async fn assemble_and_dispatch(self, head: BlockHash) -> CycleOutcome {
        let work = match self.assembler.assemble(&head).await {
            Ok(work) => work,
            Err(err @ AssemblyError::MinerAccountNotConfigured) => {
                log::warn!("Cannot assemble block: {err}");
                return CycleOutcome::Failed;
            }
            Err(err) => {
                log::debug!("Abandoning construction for head {head}: {err}");
                return CycleOutcome::Failed;
            }
        };
        self.dispatch_work(work).await
    }

    async fn dispatch_work(self, work: BlockWork) -> CycleOutcome {
        match self.dispatch(&work).await {
            Ok(retry_possible) => CycleOutcome::Dispatched {
                work,
                retry_possible,
            },
            Err(err) => {
                log::debug!("Abandoning dispatch for head {}: {err}", work.parent);
                CycleOutcome::Failed
            }
        }
    }

    /// Construct the candidate (the chain recomputes the target from elapsed
    /// time), publish the mining job and cache the candidate. Publication
    /// waits for every current subscriber, so a slow worker can never cause
    /// a duplicate dispatch of the same request.
    async fn dispatch(&self, work: &BlockWork) -> Result<bool, DispatchError> {
        let candidate = self
            .chain
            .construct_block(
                &work.parent,
                work.reward.clone(),
                work.transactions.clone(),
                &self.graffiti,
            )
            .await?;

        let request_id = self.request_ids.fetch_add(1, Ordering::Relaxed);
        let job = MiningJob {
            request_id,
            header_bytes: candidate.work_bytes()?,
            target: candidate.target(),
            sequence: candidate.sequence(),
        };
        let retry_possible = candidate.target() < Target::MAX;

        self.mining_jobs.publish(&job).await;
        self.candidates.insert(request_id, candidate);

        log::debug!(
            "Dispatched mining request {request_id} at sequence {} with target {}",
            job.sequence,
            job.target
        );
        Ok(retry_possible)
    }
}

/// The single in-flight construction slot plus the retry timer, polled as a
/// [`Stream`] from the director loop so chain events and API commands keep
/// flowing while a cycle awaits collaborator calls.
struct ConstructionWorker {
    pipeline: DispatchPipeline,
    retry_delay: time::Duration,
    in_flight: Option<BoxFuture<'static, CycleOutcome>>,
    retry: Option<(Delay, BlockWork)>,
}

impl ConstructionWorker {
    fn new(pipeline: DispatchPipeline, retry_delay: time::Duration) -> Self {
        Self {
            pipeline,
            retry_delay,
            in_flight: None,
            retry: None,
        }
    }

    fn in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Install a fresh assemble-and-dispatch cycle. The caller guarantees no
    /// cycle is currently in flight.
    fn begin_cycle(&mut self, head: BlockHash) {
        debug_assert!(self.in_flight.is_none());
        let pipeline = self.pipeline.clone();
        self.in_flight = Some(pipeline.assemble_and_dispatch(head).boxed());
    }

    /// Arm the one-shot retry timer with already-selected work. Any
    /// previously armed timer is replaced.
    fn arm_retry(&mut self, work: BlockWork) {
        self.retry = Some((Delay::new(self.retry_delay), work));
    }

    /// Disarm the timer. A disarmed timer can never fire, late or otherwise,
    /// because the loop owns its only slot.
    fn disarm_retry(&mut self) {
        self.retry = None;
    }
}

impl Stream for ConstructionWorker {
    type Item = CycleOutcome;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut task::Context,
    ) -> task::Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let Some(in_flight) = this.in_flight.as_mut() {
            return match in_flight.poll_unpin(cx) {
                Ready(outcome) => {
                    this.in_flight = None;
                    Ready(Some(outcome))
                }
                Pending => Pending,
            };
        }

        if let Some((delay, _)) = this.retry.as_mut() {
            if delay.poll_unpin(cx).is_ready() {
                let (_, work) = this.retry.take().expect("Retry slot is armed");
                log::debug!(
                    "No solution for sequence {} yet, re-dispatching with eased target",
                    work.sequence
                );
                let pipeline = this.pipeline.clone();
                let mut redispatch = pipeline.dispatch_work(work).boxed();
                //poll once so the new future registers its waker
                if let Ready(outcome) = redispatch.poll_unpin(cx) {
                    return Ready(Some(outcome));
                }
                this.in_flight = Some(redispatch);
            }
        }

        Pending
    }
}

/// The director state machine. Owns all mutable coordination state; external
/// code talks to it through [`crate::api::DirectorApi`] and the shutdown
/// handle.
pub struct Director {
    state: State,
    force_mine: bool,
    /// Head a cycle is currently assembling or dispatching for.
    current_head: Option<BlockHash>,
    /// Latest observed head not yet started. Overwritten, never queued.
    next_head: Option<BlockHash>,
    chain: Arc<dyn Chain>,
    chain_events: UnboundedReceiver<ChainEvent>,
    worker: ConstructionWorker,
    reconciler: Arc<ResultReconciler>,
    candidates: Arc<CandidateCache>,
    blocks_mined: Arc<AtomicU64>,
    api_listener: ApiListener,
    external_shutdown: UnboundedReceiver<()>,
}

impl Director {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config: &MiningConfiguration,
        force_mine: bool,
        graffiti: String,
        chain: Arc<dyn Chain>,
        chain_events: UnboundedReceiver<ChainEvent>,
        assembler: BlockAssembler,
        mining_jobs: Arc<MiningJobDispatcher>,
        block_broadcast: BlockBroadcast,
        api_listener: ApiListener,
        external_shutdown: UnboundedReceiver<()>,
    ) -> Self {
        let capacity = NonZeroUsize::new(config.candidate_cache_capacity.max(1))
            .expect("Cache capacity is at least one");
        let candidates = Arc::new(CandidateCache::new(capacity));
        let blocks_mined = Arc::new(AtomicU64::new(0));
        let reconciler = Arc::new(ResultReconciler::new(
            chain.clone(),
            candidates.clone(),
            block_broadcast,
            blocks_mined.clone(),
        ));
        let pipeline = DispatchPipeline {
            chain: chain.clone(),
            assembler,
            mining_jobs,
            candidates: candidates.clone(),
            request_ids: Arc::new(AtomicU64::new(1)),
            graffiti,
        };
        let worker =
            ConstructionWorker::new(pipeline, time::Duration::from_millis(config.retry_delay_ms));
        Self {
            state: State::Stopped,
            force_mine,
            current_head: None,
            next_head: None,
            chain,
            chain_events,
            worker,
            reconciler,
            candidates,
            blocks_mined,
            api_listener,
            external_shutdown,
        }
    }

    /// Main loop. Branch order matters: head changes must update the
    /// coalescing slot before a finished iteration picks its next head.
    pub async fn run(mut self) {
        log::info!("Starting director...");

        loop {
            tokio::select! {
                biased;

                Some(event) = self.chain_events.recv() => {
                    self.on_chain_event(event);
                }

                Some(cmd) = self.api_listener.commands_rcv.recv() => {
                    self.on_api_cmd(cmd);
                }

                _ = self.external_shutdown.recv() => {
                    log::info!("Shutting down director");
                    self.state = State::Stopped;
                    self.worker.disarm_retry();
                    if self.worker.in_flight() {
                        //let the suspended step finish, just never start another
                        self.worker.next().await;
                    }
                    break;
                }

                Some(outcome) = self.worker.next() => {
                    self.on_cycle_complete(outcome);
                }
            }
        }
        log::info!("Director stopped");
    }

    fn on_chain_event(&mut self, event: ChainEvent) {
        log::trace!("New chain event: {event:?}");
        if self.state != State::Started {
            log::trace!("Director not started, ignoring {event:?}");
            return;
        }
        match event {
            ChainEvent::HeadConnected(head) => {
                if self.mining_permitted() {
                    self.generate_block_to_mine(head);
                } else {
                    log::debug!("Chain not synced, ignoring new head {head}");
                }
            }
            ChainEvent::Synced => {
                if let Some(head) = self.chain.head() {
                    self.generate_block_to_mine(head);
                }
            }
        }
    }

    fn on_api_cmd(&mut self, cmd: ApiCmd) {
        log::trace!("New api command: {cmd}");
        match cmd {
            ApiCmd::Start(reply) => {
                self.start();
                if reply.send(Ok(())).is_err() {
                    log::error!("Failed to reply to start command");
                }
            }
            ApiCmd::SubmitSolution {
                randomness,
                request_id,
                reply,
            } => {
                //reconciliations interleave with construction and each other;
                //the candidate cache's atomic take keeps duplicates out
                let reconciler = self.reconciler.clone();
                tokio::spawn(async move {
                    let result = reconciler.successfully_mined(randomness, request_id).await;
                    if reply.send(Ok(result)).is_err() {
                        log::error!("Failed to reply to mining request {request_id}");
                    }
                });
            }
            ApiCmd::QueryStatus(reply) => {
                let status = DirectorStatus {
                    state: self.state,
                    blocks_mined: self.blocks_mined.load(Ordering::Relaxed),
                    candidates_in_flight: self.candidates.len(),
                };
                if reply.send(Ok(status)).is_err() {
                    log::error!("Failed to reply to status query");
                }
            }
        }
    }

    fn start(&mut self) {
        if self.state == State::Started {
            log::debug!("Director already started");
            return;
        }
        self.state = State::Started;
        log::info!("Director started");

        if !self.mining_permitted() {
            log::info!("Chain not synced yet, waiting before mining");
            return;
        }
        match self.chain.head() {
            Some(head) => self.generate_block_to_mine(head),
            None => log::info!("Chain has no head yet, waiting before mining"),
        }
    }

    fn mining_permitted(&self) -> bool {
        self.force_mine || self.chain.is_synced()
    }

    /// Cycle entry point. Coalesces bursts of head changes into at most one
    /// in-flight construction plus one pending follow-up.
    fn generate_block_to_mine(&mut self, head: BlockHash) {
        if self.current_head == Some(head) {
            log::trace!("Already constructing for head {head}");
            return;
        }
        //only the latest head survives; intermediate ones are superseded
        self.next_head = Some(head);
        if self.worker.in_flight() {
            log::trace!("Construction active, head {head} queued for pickup");
            return;
        }
        self.advance();
    }

    /// Consume the next-head slot and start a cycle for it.
    fn advance(&mut self) {
        let head = self.next_head.take().expect("Next head is set");
        self.current_head = Some(head);
        self.worker.disarm_retry();
        log::debug!("Starting construction for head {head}");
        self.worker.begin_cycle(head);
    }

    fn on_cycle_complete(&mut self, outcome: CycleOutcome) {
        if self.next_head.is_some() && self.state == State::Started {
            self.advance();
            return;
        }
        self.current_head = None;

        if let CycleOutcome::Dispatched {
            work,
            retry_possible: true,
        } = outcome
        {
            if self.state == State::Started {
                self.worker.arm_retry(work);
            }
        }
    }
}

/// Snapshot returned by the status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectorStatus {
    pub state: State,
    pub blocks_mined: u64,
    pub candidates_in_flight: usize,
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use async_trait::async_trait;
    use primitive_types::U256;
    use tokio::sync::mpsc;
    use tokio::sync::Mutex;
    use tokio::time::timeout;

    use crate::block::types::transaction::{Nullifier, Transaction};
    use crate::chain::{event_channel, MemoryChain};
    use crate::config::Configuration;
    use crate::core::builder::{DirectorBuilder, DirectorHandle};
    use crate::events::MiningJobSubscriber;
    use crate::fees::FlatSubsidy;
    use crate::pool::MemoryPool;
    use crate::utilities::crypto::SpendingKey;

    use super::*;

    const RECV_TIMEOUT: Duration = Duration::from_secs(5);

    /// Forwards every published job into a channel and optionally holds the
    /// publication open until the test sends a release.
    struct RecordingSubscriber {
        jobs: mpsc::UnboundedSender<MiningJob>,
        gate: Option<Mutex<mpsc::UnboundedReceiver<()>>>,
    }

    #[async_trait]
    impl MiningJobSubscriber for RecordingSubscriber {
        async fn on_mining_job(&self, job: &MiningJob) {
            self.jobs.send(job.clone()).expect("Test receiver alive");
            if let Some(gate) = &self.gate {
                gate.lock().await.recv().await;
            }
        }
    }

    struct Harness {
        chain: Arc<MemoryChain>,
        handle: DirectorHandle,
        jobs: mpsc::UnboundedReceiver<MiningJob>,
        release: mpsc::UnboundedSender<()>,
        gated: bool,
    }

    impl Harness {
        async fn next_job(&mut self) -> MiningJob {
            timeout(RECV_TIMEOUT, self.jobs.recv())
                .await
                .expect("Expected a mining job")
                .expect("Job channel open")
        }

        async fn assert_no_job(&mut self, wait: Duration) {
            assert!(
                timeout(wait, self.jobs.recv()).await.is_err(),
                "Expected no mining job"
            );
        }

        fn release_publication(&self) {
            assert!(self.gated);
            self.release.send(()).expect("Gate receiver alive");
        }

        /// Grow the chain by one block, which emits a head-connected event.
        async fn connect_block(&self) -> BlockHash {
            let head = self.chain.head().unwrap();
            let candidate = self
                .chain
                .construct_block(&head, Transaction::new(0, vec![], vec![]), vec![], "other")
                .await
                .unwrap();
            let block = candidate.seal(0);
            let hash = block.hash().unwrap();
            self.chain.append(block).await.unwrap();
            hash
        }
    }

    fn config(retry_delay_ms: u64) -> Configuration {
        let mut config = Configuration::default();
        config.mining.retry_delay_ms = retry_delay_ms;
        config.miner = Some(crate::config::MinerConfiguration {
            account_name: "miner-1".to_string(),
            spending_key: SpendingKey::generate().to_base58(),
        });
        config
    }

    async fn harness(
        chain: Arc<MemoryChain>,
        chain_events: mpsc::UnboundedReceiver<ChainEvent>,
        config: Configuration,
        gated: bool,
    ) -> Harness {
        harness_with_pool(chain, chain_events, Arc::new(MemoryPool::new()), config, gated).await
    }

    async fn harness_with_pool(
        chain: Arc<MemoryChain>,
        chain_events: mpsc::UnboundedReceiver<ChainEvent>,
        pool: Arc<MemoryPool>,
        config: Configuration,
        gated: bool,
    ) -> Harness {
        let (jobs_tx, jobs) = mpsc::unbounded_channel();
        let (release, release_rx) = mpsc::unbounded_channel();

        let (director, handle) = DirectorBuilder::new(config)
            .with_chain(chain.clone())
            .with_chain_events(chain_events)
            .with_pool(pool)
            .with_fee_strategy(Arc::new(FlatSubsidy::default()))
            .build()
            .expect("Director builds");
        handle.mining_jobs.subscribe(Arc::new(RecordingSubscriber {
            jobs: jobs_tx,
            gate: gated.then(|| Mutex::new(release_rx)),
        }));
        tokio::spawn(director.run());
        handle.api.start().await.expect("Director starts");

        Harness {
            chain,
            handle,
            jobs,
            release,
            gated,
        }
    }

    fn synced_chain(events: mpsc::UnboundedSender<ChainEvent>) -> Arc<MemoryChain> {
        let chain = Arc::new(MemoryChain::with_base_target(
            Target::MAX,
            Duration::from_secs(10),
            events,
        ));
        chain.set_synced(true);
        chain
    }

    #[tokio::test]
    async fn test_start_dispatches_for_current_head() {
        let (events_tx, events) = event_channel();
        let chain = synced_chain(events_tx);
        let mut harness = harness(chain, events, config(10_000), false).await;

        let job = harness.next_job().await;

        assert_eq!(job.sequence, 2);
        assert_eq!(job.request_id, 1);
    }

    #[tokio::test]
    async fn test_not_synced_start_waits_for_synced_event() {
        let (events_tx, events) = event_channel();
        let chain = Arc::new(MemoryChain::with_base_target(
            Target::MAX,
            Duration::from_secs(10),
            events_tx,
        ));
        let mut harness = harness(chain, events, config(10_000), false).await;

        harness.assert_no_job(Duration::from_millis(100)).await;

        harness.chain.set_synced(true);
        let job = harness.next_job().await;
        assert_eq!(job.sequence, 2);
    }

    #[tokio::test]
    async fn test_head_burst_coalesces_to_latest() {
        let (events_tx, events) = event_channel();
        let chain = synced_chain(events_tx);
        let mut harness = harness(chain, events, config(10_000), true).await;

        //first job is for genesis; publication is held open by the gate,
        //so the next three head changes arrive mid-construction
        let first = harness.next_job().await;
        assert_eq!(first.sequence, 2);

        harness.connect_block().await;
        harness.connect_block().await;
        let latest = harness.connect_block().await;
        harness.release_publication();

        //intermediate heads are superseded: exactly one follow-up job,
        //built on the burst's last head
        let second = harness.next_job().await;
        assert_eq!(second.sequence, 5);
        let work_header: crate::block::types::block::WorkHeader =
            crate::utilities::encoding::decode(&second.header_bytes).unwrap();
        assert_eq!(work_header.previous_block_hash, latest);
        harness.release_publication();

        harness.assert_no_job(Duration::from_millis(100)).await;
    }

    #[tokio::test]
    async fn test_retry_eases_target_for_same_work() {
        let (events_tx, events) = event_channel();
        //below-max target so de-escalation stays possible; fast decay so the
        //re-dispatch actually eases
        let chain = Arc::new(MemoryChain::with_base_target(
            Target::new(U256::one() << 200),
            Duration::from_millis(20),
            events_tx,
        ));
        chain.set_synced(true);
        let mut harness = harness(chain, events, config(50), false).await;

        let first = harness.next_job().await;
        let second = harness.next_job().await;

        //same already-selected work at the same sequence, fresh request id
        assert_eq!(second.sequence, first.sequence);
        assert!(second.request_id > first.request_id);
        assert!(second.target > first.target);
    }

    #[tokio::test]
    async fn test_no_retry_at_maximum_target() {
        let (events_tx, events) = event_channel();
        let chain = synced_chain(events_tx);
        let mut harness = harness(chain, events, config(30), false).await;

        harness.next_job().await;

        //target is already the easiest permitted, so no timer was armed
        harness.assert_no_job(Duration::from_millis(150)).await;
    }

    #[tokio::test]
    async fn test_head_change_cancels_retry_timer() {
        let (events_tx, events) = event_channel();
        let chain = Arc::new(MemoryChain::with_base_target(
            Target::new(U256::one() << 200),
            Duration::from_secs(60),
            events_tx,
        ));
        chain.set_synced(true);
        let mut harness = harness(chain, events, config(200), false).await;

        let first = harness.next_job().await;
        assert_eq!(first.sequence, 2);

        //new head before the timer fires; the armed retry must never run
        harness.connect_block().await;
        let second = harness.next_job().await;
        assert_eq!(second.sequence, 3);

        //past the original retry delay: only the new head's timer fires
        let third = harness.next_job().await;
        assert_eq!(third.sequence, 3);
    }

    #[tokio::test]
    async fn test_submitted_solution_connects_block() {
        let (events_tx, events) = event_channel();
        let chain = synced_chain(events_tx);
        let mut harness = harness(chain, events, config(10_000), false).await;

        let job = harness.next_job().await;
        let old_head = harness.chain.head().unwrap();

        //Target::MAX accepts any randomness
        let result = harness
            .handle
            .api
            .submit_solution(7, job.request_id)
            .await
            .unwrap();

        assert_eq!(result, MinedResult::Success);
        assert_ne!(harness.chain.head().unwrap(), old_head);

        //the connected block is a head change: construction continues on top
        let next = harness.next_job().await;
        assert_eq!(next.sequence, 3);
    }

    #[tokio::test]
    async fn test_duplicate_solution_is_unknown() {
        let (events_tx, events) = event_channel();
        let chain = synced_chain(events_tx);
        let mut harness = harness(chain, events, config(10_000), false).await;

        let job = harness.next_job().await;

        let first = harness
            .handle
            .api
            .submit_solution(7, job.request_id)
            .await
            .unwrap();
        let second = harness
            .handle
            .api
            .submit_solution(7, job.request_id)
            .await
            .unwrap();

        assert_eq!(first, MinedResult::Success);
        assert_eq!(second, MinedResult::UnknownRequest);
    }

    #[tokio::test]
    async fn test_solution_for_unknown_request() {
        let (events_tx, events) = event_channel();
        let chain = synced_chain(events_tx);
        let harness = harness(chain, events, config(10_000), false).await;

        let result = harness.handle.api.submit_solution(42, 999).await.unwrap();

        assert_eq!(result, MinedResult::UnknownRequest);
    }

    #[tokio::test]
    async fn test_status_reports_state_and_counters() {
        let (events_tx, events) = event_channel();
        let chain = synced_chain(events_tx);
        let mut harness = harness(chain, events, config(10_000), false).await;

        let job = harness.next_job().await;
        let status = harness.handle.api.status().await.unwrap();
        assert_eq!(status.state, State::Started);
        assert_eq!(status.blocks_mined, 0);
        assert_eq!(status.candidates_in_flight, 1);

        harness
            .handle
            .api
            .submit_solution(7, job.request_id)
            .await
            .unwrap();
        //the solution consumed candidate 1; the connected head dispatched
        //candidate 2, which is the only one in flight once its job is out
        let next = harness.next_job().await;
        assert_eq!(next.request_id, 2);

        let status = harness.handle.api.status().await.unwrap();
        assert_eq!(status.blocks_mined, 1);
        assert_eq!(status.candidates_in_flight, 1);
    }

    #[tokio::test]
    async fn test_assembly_failure_keeps_director_alive() {
        let (events_tx, events) = event_channel();
        let chain = synced_chain(events_tx);
        //no miner account: every assembly fails
        let mut no_miner = config(10_000);
        no_miner.miner = None;
        let mut harness = harness(chain, events, no_miner, false).await;

        harness.assert_no_job(Duration::from_millis(100)).await;

        //the loop is still alive and answers queries
        let status = harness.handle.api.status().await.unwrap();
        assert_eq!(status.state, State::Started);
    }

    #[tokio::test]
    async fn test_pool_cap_reaches_dispatched_candidate() {
        let (events_tx, events) = event_channel();
        let chain = synced_chain(events_tx);
        let pool = Arc::new(MemoryPool::new());
        for n in 0..15u8 {
            pool.add(Transaction::new(1, vec![Nullifier::new([n; 32])], vec![]));
        }
        let mut harness = harness_with_pool(chain, events, pool, config(10_000), false).await;

        let job = harness.next_job().await;
        let result = harness
            .handle
            .api
            .submit_solution(0, job.request_id)
            .await
            .unwrap();
        assert_eq!(result, MinedResult::Success);

        //10 of 15 made it into the block, 5 stayed pending
        let mut spent = 0;
        for n in 0..15u8 {
            if harness
                .chain
                .contains_nullifier(&Nullifier::new([n; 32]))
                .await
                .unwrap()
            {
                spent += 1;
            }
        }
        assert_eq!(spent, 10);
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let (events_tx, events) = event_channel();
        let chain = synced_chain(events_tx);
        let harness = harness(chain, events, config(10_000), false).await;

        harness.handle.shutdown.shutdown();

        //afterwards api calls fail because the loop is gone
        let result = timeout(RECV_TIMEOUT, async {
            loop {
                if harness.handle.api.status().await.is_err() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(result.is_ok());
    }
}
