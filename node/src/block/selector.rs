use std::collections::HashSet;

use crate::block::types::transaction::{Nullifier, Transaction};
use crate::chain::{Chain, Result};

/// One selection pass over the pending pool. The cursor yields transactions
/// whose nullifiers are neither claimed earlier in this pass nor already
/// spent on the canonical chain. Conflicts resolve by pool order: the first
/// transaction to claim a nullifier wins, later claimants are skipped.
pub(crate) struct TransactionSelector<'a> {
    chain: &'a dyn Chain,
    pending: Box<dyn Iterator<Item = Transaction> + Send + 'a>,
    seen_nullifiers: HashSet<Nullifier>,
}

impl<'a> TransactionSelector<'a> {
    pub(crate) fn new(
        chain: &'a dyn Chain,
        pending: Box<dyn Iterator<Item = Transaction> + Send + 'a>,
    ) -> Self {
        Self {
            chain,
            pending,
            seen_nullifiers: HashSet::new(),
        }
    }

    /// Next double-spend-free transaction, or `None` when the pool is
    /// exhausted. A transaction's nullifiers are registered only after all
    /// of them check out, so a skipped transaction claims nothing.
    pub(crate) async fn next_eligible(&mut self) -> Result<Option<Transaction>> {
        'candidates: while let Some(transaction) = self.pending.next() {
            for nullifier in &transaction.nullifiers {
                if self.seen_nullifiers.contains(nullifier) {
                    log::trace!("Skipping transaction, nullifier claimed in this pass: {nullifier}");
                    continue 'candidates;
                }
                if self.chain.contains_nullifier(nullifier).await? {
                    log::trace!("Skipping transaction, nullifier already spent: {nullifier}");
                    continue 'candidates;
                }
            }
            self.seen_nullifiers
                .extend(transaction.nullifiers.iter().copied());
            return Ok(Some(transaction));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod test {
    use crate::chain::{event_channel, MemoryChain};
    use crate::pool::{MemoryPool, TransactionPool};

    use super::*;

    fn nullifier(n: u8) -> Nullifier {
        Nullifier::new([n; 32])
    }

    fn transaction(fee: u64, nullifiers: Vec<Nullifier>) -> Transaction {
        Transaction::new(fee, nullifiers, vec![])
    }

    async fn select_all(chain: &MemoryChain, pool: &MemoryPool) -> Vec<Transaction> {
        let mut selector = TransactionSelector::new(chain, pool.pending());
        let mut selected = Vec::new();
        while let Some(tx) = selector.next_eligible().await.unwrap() {
            selected.push(tx);
        }
        selected
    }

    #[tokio::test]
    async fn test_first_claimant_wins_within_pass() {
        let (events, _rx) = event_channel();
        let chain = MemoryChain::new(events);
        let pool = MemoryPool::new();

        pool.add(transaction(1, vec![nullifier(1)]));
        pool.add(transaction(2, vec![nullifier(1)]));
        pool.add(transaction(3, vec![nullifier(2)]));

        let selected = select_all(&chain, &pool).await;

        let fees: Vec<u64> = selected.iter().map(|tx| tx.fee).collect();
        assert_eq!(fees, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_chain_spent_nullifier_excluded() {
        let (events, _rx) = event_channel();
        let chain = MemoryChain::new(events);
        let pool = MemoryPool::new();

        chain.mark_spent(nullifier(1));
        pool.add(transaction(1, vec![nullifier(1)]));
        pool.add(transaction(2, vec![nullifier(2)]));

        let selected = select_all(&chain, &pool).await;

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].fee, 2);
    }

    #[tokio::test]
    async fn test_skipped_transaction_claims_nothing() {
        let (events, _rx) = event_channel();
        let chain = MemoryChain::new(events);
        let pool = MemoryPool::new();

        //second nullifier disqualifies the first transaction
        chain.mark_spent(nullifier(2));
        pool.add(transaction(1, vec![nullifier(1), nullifier(2)]));
        //must still be eligible: nullifier 1 was never claimed
        pool.add(transaction(2, vec![nullifier(1)]));

        let selected = select_all(&chain, &pool).await;

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].fee, 2);
    }

    #[tokio::test]
    async fn test_transaction_without_nullifiers_is_eligible() {
        let (events, _rx) = event_channel();
        let chain = MemoryChain::new(events);
        let pool = MemoryPool::new();

        pool.add(transaction(1, vec![]));
        pool.add(transaction(2, vec![]));

        let selected = select_all(&chain, &pool).await;

        assert_eq!(selected.len(), 2);
    }
}
