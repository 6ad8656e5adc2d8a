//! Per-resource lock state: granted locks and the wait queue.

use std::collections::VecDeque;
use std::fmt;

use strand_common::types::{LockType, TxnId};
use tracing::trace;

use super::record::{Lock, LockRequest};

/// Where a blocked request joins the wait queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePosition {
    /// Ahead of everything already waiting (promotions, acquire-and-release).
    Front,
    /// Behind everything already waiting (plain acquires).
    Back,
}

/// Locks granted on a single resource plus the requests waiting for it.
///
/// Entries are created on first reference and live as long as the lock
/// manager; only their contents shrink.
#[derive(Debug, Default)]
pub struct ResourceEntry {
    /// Granted locks, in acquisition order.
    grants: Vec<Lock>,
    /// Requests that could not be granted yet.
    queue: VecDeque<LockRequest>,
}

impl ResourceEntry {
    /// Creates an empty entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether `lock_type` is compatible with every granted lock,
    /// ignoring locks held by `except`.
    pub fn check_compatible(&self, lock_type: LockType, except: Option<TxnId>) -> bool {
        self.grants
            .iter()
            .filter(|lock| Some(lock.txn_id) != except)
            .all(|lock| lock_type.compatible(lock.lock_type))
    }

    /// Records `lock` as granted.
    ///
    /// If the owner already holds a lock here, its type is replaced in place
    /// so the grant keeps its acquisition position. No compatibility checking
    /// is done.
    pub fn grant_or_update(&mut self, lock: Lock) {
        match self.grants.iter_mut().find(|held| held.txn_id == lock.txn_id) {
            Some(held) => held.lock_type = lock.lock_type,
            None => self.grants.push(lock),
        }
    }

    /// Removes a granted lock.
    ///
    /// The caller drains the queue afterwards. Releasing a lock that was
    /// never granted is a logic error.
    pub fn release(&mut self, lock: &Lock) {
        let before = self.grants.len();
        self.grants.retain(|held| held.txn_id != lock.txn_id);
        debug_assert_eq!(
            before,
            self.grants.len() + 1,
            "released lock {} was not granted",
            lock
        );
    }

    /// Adds a blocked request to the queue.
    pub fn enqueue(&mut self, request: LockRequest, position: QueuePosition) {
        match position {
            QueuePosition::Front => self.queue.push_front(request),
            QueuePosition::Back => self.queue.push_back(request),
        }
    }

    /// Removes and returns the head of the queue if it can be granted now.
    ///
    /// The head is admissible when it is compatible with every lock held by
    /// other transactions. Nothing behind the head is ever considered, so a
    /// head that cannot be granted holds back the whole queue.
    pub fn pop_admissible(&mut self) -> Option<LockRequest> {
        let head = self.queue.front()?;
        if !self.check_compatible(head.lock.lock_type, Some(head.txn_id())) {
            trace!("queue head {} still blocked", head.lock);
            return None;
        }
        self.queue.pop_front()
    }

    /// Returns the granted locks in acquisition order.
    pub fn grants(&self) -> &[Lock] {
        &self.grants
    }

    /// Returns the queued requests, front first.
    pub fn queued(&self) -> impl Iterator<Item = &LockRequest> {
        self.queue.iter()
    }

    /// Returns true if no request is waiting.
    pub fn is_queue_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl fmt::Display for ResourceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Active Locks: [")?;
        for (i, lock) in self.grants.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", lock)?;
        }
        write!(f, "], Queue: [")?;
        for (i, request) in self.queue.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", request)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::PollingTransaction;
    use strand_common::types::ResourceName;

    fn name() -> ResourceName {
        ResourceName::new("database").child("A")
    }

    fn lock(lock_type: LockType, txn: u64) -> Lock {
        Lock::new(name(), lock_type, TxnId::new(txn))
    }

    fn request(lock_type: LockType, txn: u64) -> LockRequest {
        LockRequest::new(PollingTransaction::shared(TxnId::new(txn)), lock(lock_type, txn))
    }

    #[test]
    fn test_check_compatible() {
        let mut entry = ResourceEntry::new();
        assert!(entry.check_compatible(LockType::X, None));

        entry.grant_or_update(lock(LockType::S, 1));
        assert!(entry.check_compatible(LockType::S, None));
        assert!(entry.check_compatible(LockType::IS, None));
        assert!(!entry.check_compatible(LockType::X, None));
        assert!(!entry.check_compatible(LockType::IX, None));

        // A transaction's own lock never conflicts with itself.
        assert!(entry.check_compatible(LockType::X, Some(TxnId::new(1))));
        assert!(!entry.check_compatible(LockType::X, Some(TxnId::new(2))));
    }

    #[test]
    fn test_grant_or_update_keeps_position() {
        let mut entry = ResourceEntry::new();
        entry.grant_or_update(lock(LockType::IS, 1));
        entry.grant_or_update(lock(LockType::IS, 2));
        entry.grant_or_update(lock(LockType::IS, 1));
        assert_eq!(entry.grants().len(), 2);

        entry.grant_or_update(lock(LockType::IX, 1));
        assert_eq!(entry.grants(), &[lock(LockType::IX, 1), lock(LockType::IS, 2)]);
    }

    #[test]
    fn test_release() {
        let mut entry = ResourceEntry::new();
        entry.grant_or_update(lock(LockType::S, 1));
        entry.grant_or_update(lock(LockType::S, 2));
        entry.release(&lock(LockType::S, 1));
        assert_eq!(entry.grants(), &[lock(LockType::S, 2)]);
        entry.release(&lock(LockType::S, 2));
        assert!(entry.grants().is_empty());
        assert!(entry.is_queue_empty());
    }

    #[test]
    fn test_queue_positions() {
        let mut entry = ResourceEntry::new();
        entry.enqueue(request(LockType::S, 1), QueuePosition::Back);
        entry.enqueue(request(LockType::X, 2), QueuePosition::Back);
        entry.enqueue(request(LockType::IS, 3), QueuePosition::Front);

        let order: Vec<_> = entry.queued().map(LockRequest::txn_id).collect();
        assert_eq!(order, vec![TxnId::new(3), TxnId::new(1), TxnId::new(2)]);
        assert!(!entry.is_queue_empty());
    }

    #[test]
    fn test_pop_admissible_stops_at_head() {
        let mut entry = ResourceEntry::new();
        entry.grant_or_update(lock(LockType::X, 0));
        entry.enqueue(request(LockType::S, 1), QueuePosition::Back);
        entry.enqueue(request(LockType::X, 2), QueuePosition::Back);
        entry.enqueue(request(LockType::S, 3), QueuePosition::Back);

        assert!(entry.pop_admissible().is_none());

        entry.release(&lock(LockType::X, 0));
        let head = entry.pop_admissible().unwrap();
        assert_eq!(head.txn_id(), TxnId::new(1));
        entry.grant_or_update(head.lock);

        // X@T2 conflicts with S@T1, and S@T3 must wait behind it.
        assert!(entry.pop_admissible().is_none());
        assert_eq!(entry.queued().count(), 2);
    }

    #[test]
    fn test_pop_admissible_ignores_own_grant() {
        let mut entry = ResourceEntry::new();
        entry.grant_or_update(lock(LockType::S, 1));
        entry.enqueue(request(LockType::X, 1), QueuePosition::Front);
        let head = entry.pop_admissible().unwrap();
        assert_eq!(head.lock.lock_type, LockType::X);
    }

    #[test]
    fn test_display() {
        let mut entry = ResourceEntry::new();
        entry.grant_or_update(lock(LockType::S, 1));
        entry.enqueue(request(LockType::X, 2), QueuePosition::Back);
        assert_eq!(
            entry.to_string(),
            "Active Locks: [T1: S(database/A)], Queue: [Request<T2: X(database/A)>]"
        );
    }
}
