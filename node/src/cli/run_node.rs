use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use rand::{Rng, RngCore};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{broadcast, mpsc};

use crate::api::DirectorApi;
use crate::block::types::block::Block;
use crate::block::types::transaction::{Nullifier, Transaction};
use crate::chain::memory::work_hash;
use crate::chain::{event_channel, MemoryChain};
use crate::config::Configuration;
use crate::core::builder::DirectorBuilder;
use crate::events::{MiningJob, MiningJobSubscriber};
use crate::fees::FlatSubsidy;
use crate::pool::MemoryPool;

/// How far the in-process solver searches before giving a job up.
const MAX_SOLVE_ATTEMPTS: u64 = u32::MAX as u64;

const TRANSACTION_GENERATION_INTERVAL: Duration = Duration::from_secs(2);

/// Run a self-contained node: in-memory chain and pool, an in-process
/// proof-of-work solver and a transaction generator. Real deployments wire
/// [`DirectorBuilder`] against their own collaborators instead.
#[derive(Debug, Clone, Parser)]
pub struct RunNodeCmd {
    #[clap(short, long)]
    pub config_file: String,
}

impl RunNodeCmd {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let conf = match Configuration::try_load(PathBuf::from(self.config_file.as_str())) {
            Ok(conf) => conf,
            Err(err) => anyhow::bail!("Error loading configuration file: {err:?}"),
        };

        let (chain_events_tx, chain_events) = event_channel();
        let chain = Arc::new(MemoryChain::new(chain_events_tx));
        let pool = Arc::new(MemoryPool::new());

        let (director, handle) = DirectorBuilder::new(conf)
            .with_chain(chain.clone())
            .with_chain_events(chain_events)
            .with_pool(pool.clone())
            .with_fee_strategy(Arc::new(FlatSubsidy::default()))
            .build()?;

        let (solver, solver_jobs) = DevSolver::new();
        handle.mining_jobs.subscribe(Arc::new(solver));
        tokio::spawn(solve_jobs(solver_jobs, handle.api.clone()));
        tokio::spawn(prune_pool(handle.mined_blocks.subscribe(), pool.clone()));
        tokio::spawn(generate_transactions(pool));

        let director_handle = tokio::spawn(director.run());

        //the in-memory chain has nothing to sync with
        chain.set_synced(true);
        handle.api.start().await?;

        let shutdown = async {
            let mut stream_int = signal(SignalKind::interrupt()).unwrap();
            let mut stream_term = signal(SignalKind::terminate()).unwrap();
            tokio::select! {
                _ = stream_int.recv() => {
                    handle.shutdown.shutdown();
                }
                _ = stream_term.recv() => {
                    handle.shutdown.shutdown();
                }
            }
        };

        //Wait shutdown signal
        shutdown.await;
        director_handle.await?;
        Ok(())
    }
}

/// Forwards jobs out of the publication path; solving happens on its own
/// task so publication never waits on the search.
struct DevSolver {
    jobs: mpsc::UnboundedSender<MiningJob>,
}

impl DevSolver {
    fn new() -> (Self, mpsc::UnboundedReceiver<MiningJob>) {
        let (jobs, receiver) = mpsc::unbounded_channel();
        (Self { jobs }, receiver)
    }
}

#[async_trait]
impl MiningJobSubscriber for DevSolver {
    async fn on_mining_job(&self, job: &MiningJob) {
        if self.jobs.send(job.clone()).is_err() {
            log::debug!("Solver task gone, dropping job {}", job.request_id);
        }
    }
}

async fn solve_jobs(mut jobs: mpsc::UnboundedReceiver<MiningJob>, api: DirectorApi) {
    while let Some(mut job) = jobs.recv().await {
        //older queued jobs are stale by definition, grind only the newest
        while let Ok(newer) = jobs.try_recv() {
            job = newer;
        }

        let search = job.clone();
        let randomness =
            tokio::task::spawn_blocking(move || find_randomness(&search)).await.ok().flatten();

        let Some(randomness) = randomness else {
            log::warn!("Gave up solving mining request {}", job.request_id);
            continue;
        };
        match api.submit_solution(randomness, job.request_id).await {
            Ok(result) => {
                log::info!("Mining request {} resolved: {result:?}", job.request_id);
            }
            Err(err) => {
                log::error!("Failed to submit solution: {err}");
                break;
            }
        }
    }
}

fn find_randomness(job: &MiningJob) -> Option<u64> {
    (0..MAX_SOLVE_ATTEMPTS).find(|randomness| {
        job.target.meets(&work_hash(&job.header_bytes, *randomness))
    })
}

async fn prune_pool(mut blocks: broadcast::Receiver<Block>, pool: Arc<MemoryPool>) {
    loop {
        match blocks.recv().await {
            Ok(block) => {
                let spent: HashSet<Nullifier> = block.spent_nullifiers().copied().collect();
                pool.remove_spent(&spent);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::debug!("Pool pruning lagged {skipped} blocks behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn generate_transactions(pool: Arc<MemoryPool>) {
    loop {
        tokio::time::sleep(TRANSACTION_GENERATION_INTERVAL).await;

        let mut nullifier = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut nullifier);
        let fee = rand::thread_rng().gen_range(1..100);
        pool.add(Transaction::new(
            fee,
            vec![Nullifier::new(nullifier)],
            vec![],
        ));
    }
}
