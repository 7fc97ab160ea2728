use std::collections::HashSet;

use parking_lot::Mutex;

use crate::block::types::transaction::{Nullifier, Transaction};
use crate::pool::TransactionPool;

/// In-memory pool iterating in arrival order.
pub struct MemoryPool {
    pending_transactions: Mutex<Vec<Transaction>>,
}

impl MemoryPool {
    pub fn new() -> Self {
        Self {
            pending_transactions: Mutex::new(Vec::new()),
        }
    }

    pub fn add(&self, transaction: Transaction) {
        let mut pending = self.pending_transactions.lock();
        log::debug!("Adding transaction to pool: {transaction}");
        pending.push(transaction);
        log::debug!("Transaction pool size: {}", pending.len());
    }

    /// Drop every pending transaction claiming one of the spent nullifiers.
    /// The `run-node` command calls this when a new block connects.
    pub fn remove_spent(&self, spent: &HashSet<Nullifier>) {
        let mut pending = self.pending_transactions.lock();
        let before = pending.len();
        pending.retain(|tx| !tx.nullifiers.iter().any(|n| spent.contains(n)));
        let removed = before - pending.len();
        if removed > 0 {
            log::debug!("Removed {removed} spent transactions from pool");
        }
    }

    pub fn len(&self) -> usize {
        self.pending_transactions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending_transactions.lock().is_empty()
    }
}

impl Default for MemoryPool {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionPool for MemoryPool {
    fn pending(&self) -> Box<dyn Iterator<Item = Transaction> + Send + '_> {
        //Snapshot so the lock is not held while a selection pass awaits
        let pending = self.pending_transactions.lock().clone();
        Box::new(pending.into_iter())
    }
}
