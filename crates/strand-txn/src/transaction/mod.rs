//! The blocking hand-off between the lock manager and its callers.
//!
//! The lock manager never creates or owns transactions. It only needs a
//! stable id and a way to park and wake the caller, which is what the
//! [`Transaction`] trait captures. Two backends are provided:
//!
//! - [`ThreadTransaction`]: parks the calling OS thread on a condition
//!   variable until it is unblocked.
//! - [`PollingTransaction`]: never parks; the host polls
//!   [`Transaction::is_blocked`]. Suits cooperative schedulers and
//!   deterministic single-threaded tests.
//!
//! # Blocking Protocol
//!
//! ```text
//!   caller thread                         lock manager
//!   ─────────────                         ────────────
//!   acquire() ─────────────────────────▶ take table lock
//!                                         incompatible → enqueue
//!                                         prepare_block()
//!                                         drop table lock
//!   block()  ◀──────────────────────────  return
//!      │
//!      │            (another thread)      release() → drain queue
//!      │                                  grant, then unblock()
//!      ▼
//!   returns, lock held
//! ```
//!
//! `prepare_block` runs inside the critical section so an `unblock` that
//! races ahead of `block` is never lost.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use strand_common::types::TxnId;

/// A transaction as seen by the lock manager.
pub trait Transaction: Send + Sync {
    /// Returns the stable transaction id.
    fn id(&self) -> TxnId;

    /// Marks the transaction as about to block.
    ///
    /// Called by the lock manager while it holds its critical section.
    fn prepare_block(&self);

    /// Suspends the caller until [`Transaction::unblock`] is called.
    ///
    /// Called outside the lock manager's critical section. Returns
    /// immediately if the transaction was already unblocked.
    fn block(&self);

    /// Wakes a blocked transaction. Must never block.
    fn unblock(&self);

    /// Returns true between `prepare_block` and `unblock`.
    fn is_blocked(&self) -> bool;
}

/// Shared handle to a transaction, as stored in wait queues.
pub type TransactionRef = Arc<dyn Transaction>;

/// A transaction backed by an OS thread that parks while waiting.
pub struct ThreadTransaction {
    id: TxnId,
    blocked: Mutex<bool>,
    wakeup: Condvar,
}

impl ThreadTransaction {
    /// Creates a new, unblocked transaction.
    pub fn new(id: TxnId) -> Self {
        Self {
            id,
            blocked: Mutex::new(false),
            wakeup: Condvar::new(),
        }
    }

    /// Creates a new transaction behind a [`TransactionRef`].
    pub fn shared(id: TxnId) -> TransactionRef {
        Arc::new(Self::new(id))
    }
}

impl Transaction for ThreadTransaction {
    fn id(&self) -> TxnId {
        self.id
    }

    fn prepare_block(&self) {
        *self.blocked.lock() = true;
    }

    fn block(&self) {
        let mut blocked = self.blocked.lock();
        while *blocked {
            self.wakeup.wait(&mut blocked);
        }
    }

    fn unblock(&self) {
        let mut blocked = self.blocked.lock();
        *blocked = false;
        self.wakeup.notify_all();
    }

    fn is_blocked(&self) -> bool {
        *self.blocked.lock()
    }
}

impl fmt::Debug for ThreadTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadTransaction")
            .field("id", &self.id)
            .field("blocked", &self.is_blocked())
            .finish()
    }
}

/// A transaction whose `block` returns immediately.
///
/// Operations that would have parked return at once; the host checks
/// [`Transaction::is_blocked`] to learn whether the request is still queued.
#[derive(Debug)]
pub struct PollingTransaction {
    id: TxnId,
    blocked: AtomicBool,
}

impl PollingTransaction {
    /// Creates a new, unblocked transaction.
    pub fn new(id: TxnId) -> Self {
        Self {
            id,
            blocked: AtomicBool::new(false),
        }
    }

    /// Creates a new transaction behind a [`TransactionRef`].
    pub fn shared(id: TxnId) -> TransactionRef {
        Arc::new(Self::new(id))
    }
}

impl Transaction for PollingTransaction {
    fn id(&self) -> TxnId {
        self.id
    }

    fn prepare_block(&self) {
        self.blocked.store(true, Ordering::Release);
    }

    fn block(&self) {}

    fn unblock(&self) {
        self.blocked.store(false, Ordering::Release);
    }

    fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_polling_transaction() {
        let txn = PollingTransaction::new(TxnId::new(1));
        assert_eq!(txn.id(), TxnId::new(1));
        assert!(!txn.is_blocked());

        txn.prepare_block();
        assert!(txn.is_blocked());
        txn.block();
        assert!(txn.is_blocked());

        txn.unblock();
        assert!(!txn.is_blocked());
    }

    #[test]
    fn test_thread_transaction_unblock_before_block() {
        let txn = ThreadTransaction::new(TxnId::new(1));
        txn.prepare_block();
        txn.unblock();
        // Must not hang: the wakeup already happened.
        txn.block();
        assert!(!txn.is_blocked());
    }

    #[test]
    fn test_thread_transaction_wakes_parked_thread() {
        let txn = Arc::new(ThreadTransaction::new(TxnId::new(2)));
        txn.prepare_block();

        let waiter = {
            let txn = Arc::clone(&txn);
            thread::spawn(move || {
                txn.block();
                txn.is_blocked()
            })
        };

        thread::sleep(Duration::from_millis(20));
        assert!(txn.is_blocked());
        txn.unblock();

        let still_blocked = waiter.join().unwrap();
        assert!(!still_blocked);
    }

    #[test]
    fn test_shared_handles() {
        let a = ThreadTransaction::shared(TxnId::new(5));
        let b = PollingTransaction::shared(TxnId::new(6));
        assert_eq!(a.id(), TxnId::new(5));
        assert_eq!(b.id(), TxnId::new(6));
        assert!(format!("{:?}", ThreadTransaction::new(TxnId::new(5))).contains("TxnId(5)"));
    }
}
