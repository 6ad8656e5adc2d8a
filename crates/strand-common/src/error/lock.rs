//! Lock error types.
//!
//! Every error here is a caller-correctable precondition violation. The
//! lock manager checks all preconditions before touching any state, so an
//! operation that returns one of these has changed nothing.

use std::fmt;
use thiserror::Error;

use crate::types::{LockType, ResourceName, TxnId};

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and
/// are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Invalid argument provided.
    InvalidArgument = 0x0003,

    // Transaction errors (0x0300 - 0x03FF)
    /// The transaction already holds the requested lock.
    DuplicateLockRequest = 0x0310,
    /// The transaction does not hold a lock it referenced.
    NoLockHeld = 0x0311,
    /// The requested lock change is not a valid promotion.
    InvalidLock = 0x0312,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x03 => "Transaction",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The error type for lock manager operations.
///
/// # Example
///
/// ```rust
/// use strand_common::error::{ErrorCode, LockError};
/// use strand_common::types::{ResourceName, TxnId};
///
/// let err = LockError::NoLockHeld {
///     txn_id: TxnId::new(1),
///     resource: ResourceName::new("database"),
/// };
/// assert_eq!(err.code(), ErrorCode::NoLockHeld);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    // ==========================================================================
    // Lock Request Errors
    // ==========================================================================
    /// The transaction already holds a lock that makes the request redundant.
    #[error("transaction {txn_id} already holds {lock_type} on {resource}")]
    DuplicateRequest {
        /// The requesting transaction.
        txn_id: TxnId,
        /// The resource named in the request.
        resource: ResourceName,
        /// The lock type the transaction already holds.
        lock_type: LockType,
    },

    /// The transaction holds no lock on a resource it referenced.
    #[error("transaction {txn_id} holds no lock on {resource}")]
    NoLockHeld {
        /// The requesting transaction.
        txn_id: TxnId,
        /// The resource with no lock.
        resource: ResourceName,
    },

    /// The requested type is not a valid promotion of the held type.
    #[error("transaction {txn_id} cannot promote {from} to {to} on {resource}")]
    InvalidLock {
        /// The requesting transaction.
        txn_id: TxnId,
        /// The resource being promoted.
        resource: ResourceName,
        /// The currently held lock type.
        from: LockType,
        /// The requested lock type.
        to: LockType,
    },

    // ==========================================================================
    // Input Errors
    // ==========================================================================
    /// A lock type name did not match any known lock type.
    #[error("unknown lock type: {name:?}")]
    UnknownLockType {
        /// The unrecognized name.
        name: String,
    },

    /// A resource name had an empty path segment.
    #[error("invalid resource name: {name:?}")]
    InvalidResourceName {
        /// The rejected name.
        name: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },
}

impl LockError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::DuplicateRequest { .. } => ErrorCode::DuplicateLockRequest,
            Self::NoLockHeld { .. } => ErrorCode::NoLockHeld,
            Self::InvalidLock { .. } => ErrorCode::InvalidLock,
            Self::UnknownLockType { .. }
            | Self::InvalidResourceName { .. }
            | Self::InvalidConfig { .. } => ErrorCode::InvalidArgument,
        }
    }

    /// Returns the transaction the error concerns, if any.
    #[must_use]
    pub fn txn_id(&self) -> Option<TxnId> {
        match self {
            Self::DuplicateRequest { txn_id, .. }
            | Self::NoLockHeld { txn_id, .. }
            | Self::InvalidLock { txn_id, .. } => Some(*txn_id),
            _ => None,
        }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
