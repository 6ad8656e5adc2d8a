//! Lock management for transaction isolation.
//!
//! This module implements the lock table of a multigranularity lock
//! manager:
//! - Six lock types (NL, IS, IX, S, SIX, X) with their compatibility and
//!   substitution relations
//! - Per-resource grant lists kept in acquisition order
//! - FIFO wait queues with strict head-of-line blocking
//! - Atomic acquire-and-release and in-place promotion
//!
//! Which locks to take on which level of the hierarchy is up to the caller;
//! [`LockType::parent_lock`] and [`LockType::can_be_parent_lock`] supply the
//! rules.

mod entry;
mod manager;
mod record;

pub use entry::{QueuePosition, ResourceEntry};
pub use manager::{LockManager, LockStats};
pub use record::{Lock, LockRequest};

pub use strand_common::types::LockType;
