//! Benchmark utilities and helpers.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use strand_txn::{PollingTransaction, ResourceName, TransactionRef, TxnId};

/// Generates `count` sibling resources under `database/<table>`.
pub fn generate_rows(table: &str, count: usize) -> Vec<ResourceName> {
    let parent = ResourceName::new("database").child(table);
    (0..count).map(|i| parent.child(&format!("{:08}", i))).collect()
}

/// Generates `count` polling transactions with ids starting at 1.
pub fn generate_txns(count: usize) -> Vec<TransactionRef> {
    (1..=count as u64)
        .map(|id| PollingTransaction::shared(TxnId::new(id)))
        .collect()
}

/// Generates a shuffled access order over `count` resources.
pub fn random_order(count: usize) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut order: Vec<usize> = (0..count).collect();
    order.shuffle(&mut rng);
    order
}
