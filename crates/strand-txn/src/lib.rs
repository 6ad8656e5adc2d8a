//! # strand-txn
//!
//! Lock manager core for strand.
//!
//! This crate tracks, for every resource and every transaction, which locks
//! are held and which are queued, and decides whether a request can be
//! granted right away:
//!
//! - **Lock Table**: granted locks per resource and per transaction, kept in
//!   acquisition order.
//!
//! - **Wait Queues**: FIFO per resource; promotions and acquire-and-release
//!   requests jump to the front, plain acquires join the back.
//!
//! - **Blocking Hand-off**: the manager arms the caller's [`Transaction`]
//!   inside its critical section and lets it park outside.
//!
//! - **Lock Contexts**: identity-mapped handles onto the resource hierarchy.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       LockManager                        │
//! │                            │                             │
//! │             ┌──────────────┴──────────────┐              │
//! │             ▼                             ▼              │
//! │   ┌──────────────────┐         ┌─────────────────────┐   │
//! │   │ Mutex<LockTable> │         │ LockContext registry│   │
//! │   └──────────────────┘         └─────────────────────┘   │
//! │       │          │                                       │
//! │       ▼          ▼                                       │
//! │  txn_locks   resources: ResourceEntry                    │
//! │              (grants + wait queue)                       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use strand_txn::{LockManager, LockType, PollingTransaction, ResourceName, Transaction, TxnId};
//!
//! let lm = LockManager::new();
//! let t1 = PollingTransaction::shared(TxnId::new(1));
//! let t2 = PollingTransaction::shared(TxnId::new(2));
//! let a = ResourceName::new("database").child("A");
//!
//! lm.acquire(&t1, &a, LockType::S).unwrap();
//! lm.acquire(&t2, &a, LockType::X).unwrap();
//! assert!(t2.is_blocked());
//!
//! lm.release(&t1, &a).unwrap();
//! assert!(!t2.is_blocked());
//! assert_eq!(lm.get_lock_type(TxnId::new(2), &a), LockType::X);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Lock table implementation.
///
/// This module provides:
/// - [`lock::LockManager`]: Manages all locks
/// - [`lock::ResourceEntry`]: Grants and wait queue of one resource
/// - [`lock::Lock`] and [`lock::LockRequest`]: Granted and pending locks
pub mod lock;

/// Transactions as seen by the lock manager.
///
/// This module provides:
/// - [`transaction::Transaction`]: The blocking hand-off trait
/// - [`transaction::ThreadTransaction`]: Parks an OS thread
/// - [`transaction::PollingTransaction`]: Never parks; poll `is_blocked`
pub mod transaction;

/// Lock contexts.
///
/// This module provides:
/// - [`context::LockContext`]: Identity-mapped handle onto a resource
pub mod context;

// Re-export commonly used types

pub use context::LockContext;

pub use lock::{Lock, LockManager, LockRequest, LockStats, QueuePosition, ResourceEntry};

pub use transaction::{PollingTransaction, ThreadTransaction, Transaction, TransactionRef};

pub use strand_common::{
    ErrorCode, LockError, LockManagerConfig, LockResult, LockType, ResourceName, TxnId,
};
