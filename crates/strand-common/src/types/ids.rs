//! Transaction identifiers.

use std::fmt;

/// Identifies the transaction that owns a lock or a queued request.
///
/// The lock manager never allocates these; the surrounding transaction
/// layer hands them in. They key the per-transaction lock lists and tell a
/// transaction's own grants apart from everyone else's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxnId(u64);

impl TxnId {
    /// Wraps a caller-assigned id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
