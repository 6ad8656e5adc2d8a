//! Configuration for strand.
//!
//! This module provides configuration structures for the lock manager.

mod lock;

pub use lock::LockManagerConfig;
