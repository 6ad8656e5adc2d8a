//! Error handling for strand.
//!
//! This module provides the lock error taxonomy and result alias used
//! across all strand components.

mod lock;

pub use lock::{ErrorCode, LockError};

/// Result type alias for lock manager operations.
pub type LockResult<T> = std::result::Result<T, LockError>;
