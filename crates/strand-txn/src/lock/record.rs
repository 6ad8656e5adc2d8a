//! Lock records and queued lock requests.

use std::fmt;

use strand_common::types::{LockType, ResourceName, TxnId};

use crate::transaction::TransactionRef;

/// A lock held (or wanted) by one transaction on one resource.
///
/// Two locks are equal iff resource, type, and owner all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lock {
    /// The locked resource.
    pub name: ResourceName,
    /// The lock type.
    pub lock_type: LockType,
    /// The owning transaction.
    pub txn_id: TxnId,
}

impl Lock {
    /// Creates a new lock record.
    pub fn new(name: ResourceName, lock_type: LockType, txn_id: TxnId) -> Self {
        Self {
            name,
            lock_type,
            txn_id,
        }
    }
}

impl fmt::Display for Lock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}: {}({})", self.txn_id, self.lock_type, self.name)
    }
}

/// A lock request that could not be granted right away.
#[derive(Clone)]
pub struct LockRequest {
    /// Transaction waiting on the request.
    pub transaction: TransactionRef,
    /// The lock to grant.
    pub lock: Lock,
    /// Locks to release once `lock` is granted. Empty for plain acquires.
    pub release: Vec<Lock>,
}

impl LockRequest {
    /// Creates a plain acquire request.
    pub fn new(transaction: TransactionRef, lock: Lock) -> Self {
        Self::with_release(transaction, lock, Vec::new())
    }

    /// Creates an acquire-and-release request.
    pub fn with_release(transaction: TransactionRef, lock: Lock, release: Vec<Lock>) -> Self {
        Self {
            transaction,
            lock,
            release,
        }
    }

    /// Returns the requesting transaction's id.
    pub fn txn_id(&self) -> TxnId {
        self.lock.txn_id
    }

    /// Returns the names of the resources to release on grant.
    pub fn release_names(&self) -> Vec<ResourceName> {
        self.release.iter().map(|lock| lock.name.clone()).collect()
    }
}

impl fmt::Debug for LockRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockRequest")
            .field("lock", &self.lock)
            .field("release", &self.release)
            .finish()
    }
}

impl fmt::Display for LockRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.release.is_empty() {
            return write!(f, "Request<{}>", self.lock);
        }
        write!(f, "Request<{}, releasing [", self.lock)?;
        for (i, lock) in self.release.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", lock.name)?;
        }
        write!(f, "]>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::PollingTransaction;

    #[test]
    fn test_lock_equality() {
        let a = ResourceName::new("database").child("A");
        let lock = Lock::new(a.clone(), LockType::S, TxnId::new(1));
        assert_eq!(lock, Lock::new(a.clone(), LockType::S, TxnId::new(1)));
        assert_ne!(lock, Lock::new(a.clone(), LockType::X, TxnId::new(1)));
        assert_ne!(lock, Lock::new(a, LockType::S, TxnId::new(2)));
    }

    #[test]
    fn test_lock_display() {
        let lock = Lock::new(
            ResourceName::new("database").child("A"),
            LockType::SIX,
            TxnId::new(4),
        );
        assert_eq!(lock.to_string(), "T4: SIX(database/A)");
    }

    #[test]
    fn test_request_release_names() {
        let db = ResourceName::new("database");
        let txn = PollingTransaction::shared(TxnId::new(1));

        let plain = LockRequest::new(txn.clone(), Lock::new(db.clone(), LockType::X, TxnId::new(1)));
        assert_eq!(plain.txn_id(), TxnId::new(1));
        assert!(plain.release_names().is_empty());
        assert_eq!(plain.to_string(), "Request<T1: X(database)>");

        let a = db.child("A");
        let replace = LockRequest::with_release(
            txn,
            Lock::new(db.clone(), LockType::X, TxnId::new(1)),
            vec![Lock::new(a.clone(), LockType::S, TxnId::new(1))],
        );
        assert_eq!(replace.release_names(), vec![a]);
        assert_eq!(
            replace.to_string(),
            "Request<T1: X(database), releasing [database/A]>"
        );
    }
}
