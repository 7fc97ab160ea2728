//! # Headframe
//!
//! The block-production coordinator of a proof-of-work blockchain node. It
//! selects double-spend-free pending transactions, assembles unsolved block
//! candidates, hands them to external proof-of-work workers, re-dispatches
//! with an eased target on a timer and reconciles reported solutions against
//! the live chain head.
//!
//! The chain, the pending-transaction pool and the fee policy are
//! collaborators behind traits ([`chain::Chain`], [`pool::TransactionPool`],
//! [`fees::FeeStrategy`]); in-memory implementations back the `run-node`
//! command and the tests.

pub mod api;
pub mod block;
pub mod chain;
pub mod cli;
pub mod config;
pub mod core;
pub mod director;
pub mod events;
pub mod fees;
pub mod logging;
pub(crate) mod metrics;
pub mod pool;
pub mod utilities;

pub use crate::api::DirectorApi;
pub use crate::core::builder::{DirectorBuilder, DirectorHandle};
pub use crate::core::shutdown;
pub use crate::director::{Director, DirectorStatus, MinedResult, MiningRequestId, State};
