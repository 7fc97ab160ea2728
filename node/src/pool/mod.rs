//! # Pending-transaction pool
//!
//! The pool's internal structure is not the director's concern. Selection
//! only needs an ordered walk over what is pending right now; [`MemoryPool`]
//! is the in-process implementation used by the `run-node` command and the tests.

use crate::block::types::transaction::Transaction;

pub mod memory;

pub use memory::MemoryPool;

pub trait TransactionPool: Send + Sync {
    /// Ordered view of the currently pending transactions. The order is the
    /// pool's native one; selection consumes it lazily and never reorders.
    fn pending(&self) -> Box<dyn Iterator<Item = Transaction> + Send + '_>;
}
