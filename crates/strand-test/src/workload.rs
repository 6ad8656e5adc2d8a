//! Seeded lock workloads over a two-level hierarchy.
//!
//! Every generated operation touches one path from the database down, takes
//! its locks top-down with the right intent locks on the ancestors, and
//! releases them all at the end. A transaction therefore waits at most once,
//! on its last lock, which keeps randomly interleaved workloads free of
//! deadlocks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strand_txn::{LockManager, LockResult, LockType, TransactionRef};
use tracing::trace;

/// A single unit of locking work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOp {
    /// S on one row.
    ReadRow {
        /// Table index.
        table: usize,
        /// Row index.
        row: usize,
    },
    /// X on one row.
    WriteRow {
        /// Table index.
        table: usize,
        /// Row index.
        row: usize,
    },
    /// S on a whole table.
    ScanTable {
        /// Table index.
        table: usize,
    },
}

impl LockOp {
    /// Returns the lock type taken on the leaf resource.
    pub fn leaf_lock(&self) -> LockType {
        match self {
            LockOp::ReadRow { .. } | LockOp::ScanTable { .. } => LockType::S,
            LockOp::WriteRow { .. } => LockType::X,
        }
    }

    /// Returns the table this operation touches.
    pub fn table(&self) -> usize {
        match *self {
            LockOp::ReadRow { table, .. }
            | LockOp::WriteRow { table, .. }
            | LockOp::ScanTable { table } => table,
        }
    }
}

/// Shape of a generated workload.
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Number of tables.
    pub tables: usize,
    /// Rows per table.
    pub rows_per_table: usize,
    /// Percentage of row operations that write.
    pub write_percent: u32,
    /// Percentage of all operations that scan a table.
    pub scan_percent: u32,
    /// RNG seed.
    pub seed: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            tables: 2,
            rows_per_table: 8,
            write_percent: 30,
            scan_percent: 5,
            seed: 42,
        }
    }
}

/// Generates `count` operations from `config`.
///
/// The same config always produces the same operations.
pub fn generate_ops(config: &WorkloadConfig, count: usize) -> Vec<LockOp> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    (0..count).map(|_| next_op(config, &mut rng)).collect()
}

fn next_op(config: &WorkloadConfig, rng: &mut StdRng) -> LockOp {
    let table = rng.gen_range(0..config.tables);
    if rng.gen_range(0..100) < config.scan_percent {
        return LockOp::ScanTable { table };
    }
    let row = rng.gen_range(0..config.rows_per_table);
    if rng.gen_range(0..100) < config.write_percent {
        LockOp::WriteRow { table, row }
    } else {
        LockOp::ReadRow { table, row }
    }
}

/// Returns the table name used for table index `table`.
pub fn table_name(table: usize) -> String {
    format!("t{}", table)
}

/// Takes the locks `op` needs for `txn`, top-down, through the manager's
/// contexts. Blocks while any of them is unavailable.
pub fn lock_path(lm: &LockManager, txn: &TransactionRef, op: &LockOp) -> LockResult<()> {
    let leaf_lock = op.leaf_lock();
    let intent = leaf_lock.parent_lock();
    let db = lm.database_context();
    let table = db.child(&table_name(op.table()));

    trace!("transaction {} running {:?}", txn.id(), op);
    db.acquire(lm, txn, intent)?;
    match *op {
        LockOp::ScanTable { .. } => table.acquire(lm, txn, leaf_lock),
        LockOp::ReadRow { row, .. } | LockOp::WriteRow { row, .. } => {
            table.acquire(lm, txn, intent)?;
            table.child(&row.to_string()).acquire(lm, txn, leaf_lock)
        }
    }
}

/// Runs `op` as one transaction: locks its path, calls `work` while the
/// locks are held, then releases everything.
pub fn run_op<F>(lm: &LockManager, txn: &TransactionRef, op: &LockOp, work: F) -> LockResult<()>
where
    F: FnOnce(),
{
    lock_path(lm, txn, op)?;
    work();
    lm.release_all(txn);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_txn::{PollingTransaction, TxnId};

    #[test]
    fn test_generate_ops_is_deterministic() {
        let config = WorkloadConfig::default();
        let a = generate_ops(&config, 64);
        let b = generate_ops(&config, 64);
        assert_eq!(a, b);
        assert!(a.iter().all(|op| op.table() < config.tables));

        let other = generate_ops(&WorkloadConfig { seed: 7, ..config }, 64);
        assert_ne!(a, other);
    }

    #[test]
    fn test_generate_ops_respects_percentages() {
        let config = WorkloadConfig {
            write_percent: 0,
            scan_percent: 0,
            ..WorkloadConfig::default()
        };
        let ops = generate_ops(&config, 100);
        assert!(ops.iter().all(|op| matches!(op, LockOp::ReadRow { .. })));
    }

    #[test]
    fn test_lock_path_takes_intent_locks() {
        let lm = LockManager::new();
        let txn = PollingTransaction::shared(TxnId::new(1));
        let op = LockOp::WriteRow { table: 1, row: 3 };

        lock_path(&lm, &txn, &op).unwrap();
        let held: Vec<_> = lm
            .get_txn_locks(TxnId::new(1))
            .into_iter()
            .map(|lock| (lock.name.to_string(), lock.lock_type))
            .collect();
        assert_eq!(
            held,
            vec![
                ("database".to_string(), LockType::IX),
                ("database/t1".to_string(), LockType::IX),
                ("database/t1/3".to_string(), LockType::X),
            ]
        );

        assert_eq!(lm.release_all(&txn), 3);
    }

    #[test]
    fn test_run_op_releases_everything() {
        let lm = LockManager::new();
        let txn = PollingTransaction::shared(TxnId::new(1));
        let mut ran = false;

        run_op(&lm, &txn, &LockOp::ScanTable { table: 0 }, || ran = true).unwrap();
        assert!(ran);
        assert!(lm.get_txn_locks(TxnId::new(1)).is_empty());
        assert!(lm.verify_invariants().is_ok());
    }
}
