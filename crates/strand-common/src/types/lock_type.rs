//! Lock types and the relations between them.
//!
//! Every relation here is a total function over the six lock types,
//! written out as an exhaustive match so the compiler checks coverage.
//!
//! # Compatibility Matrix
//!
//! ```text
//!          │ NL │ IS │ IX │ S  │ SIX │ X  │
//! ─────────┼────┼────┼────┼────┼─────┼────┤
//!     NL   │ ✓  │ ✓  │ ✓  │ ✓  │  ✓  │ ✓  │
//!     IS   │ ✓  │ ✓  │ ✓  │ ✓  │  ✓  │ ✗  │
//!     IX   │ ✓  │ ✓  │ ✓  │ ✗  │  ✗  │ ✗  │
//!     S    │ ✓  │ ✓  │ ✗  │ ✓  │  ✗  │ ✗  │
//!     SIX  │ ✓  │ ✓  │ ✗  │ ✗  │  ✗  │ ✗  │
//!     X    │ ✓  │ ✗  │ ✗  │ ✗  │  ✗  │ ✗  │
//! ```
//!
//! # Substitution Lattice
//!
//! ```text
//!            X
//!            │
//!           SIX
//!          ╱   ╲
//!        IX     S
//!          ╲   ╱
//!           IS
//!            │
//!           NL
//! ```
//!
//! A lock may stand in for every lock below it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LockError;

/// Lock type held on (or requested for) a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockType {
    /// No lock held.
    NL,
    /// Intention shared: shared locks will be taken on descendants.
    IS,
    /// Intention exclusive: exclusive locks will be taken on descendants.
    IX,
    /// Shared (read) lock on the whole subtree.
    S,
    /// Shared on the subtree plus intention exclusive on descendants.
    SIX,
    /// Exclusive (write) lock on the whole subtree.
    X,
}

impl LockType {
    /// Every lock type, weakest first.
    pub const ALL: [LockType; 6] = [
        LockType::NL,
        LockType::IS,
        LockType::IX,
        LockType::S,
        LockType::SIX,
        LockType::X,
    ];

    /// Checks whether a transaction holding `self` and a different
    /// transaction holding `other` may coexist on one resource.
    #[must_use]
    pub fn compatible(self, other: LockType) -> bool {
        use LockType::*;
        matches!(
            (self, other),
            (NL, _) | (_, NL) |
            // IS coexists with everything but X
            (IS, IS | IX | S | SIX) | (IX | S | SIX, IS) |
            (IX, IX) |
            (S, S)
        )
    }

    /// Checks whether `self` may be used where `required` is needed.
    ///
    /// True iff `self` dominates `required` in the substitution lattice.
    #[must_use]
    pub fn substitutable(self, required: LockType) -> bool {
        use LockType::*;
        match self {
            NL => required == NL,
            IS => matches!(required, NL | IS),
            IX => matches!(required, NL | IS | IX),
            S => matches!(required, NL | IS | S),
            SIX => required != X,
            X => true,
        }
    }

    /// Returns the lock that must be held on the parent resource before
    /// `self` can be acquired on a child.
    #[must_use]
    pub fn parent_lock(self) -> LockType {
        use LockType::*;
        match self {
            S | IS => IS,
            X | IX | SIX => IX,
            NL => NL,
        }
    }

    /// Checks whether holding `self` on a resource permits granting `child`
    /// on one of its children.
    #[must_use]
    pub fn can_be_parent_lock(self, child: LockType) -> bool {
        use LockType::*;
        match self {
            // S and X already cover the whole subtree.
            NL | S | X => child == NL,
            IS => matches!(child, NL | IS | S),
            IX | SIX => true,
        }
    }

    /// Returns true for the intention locks IS, IX and SIX.
    #[must_use]
    pub fn is_intent(self) -> bool {
        matches!(self, LockType::IS | LockType::IX | LockType::SIX)
    }

    /// Returns the canonical short name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LockType::NL => "NL",
            LockType::IS => "IS",
            LockType::IX => "IX",
            LockType::S => "S",
            LockType::SIX => "SIX",
            LockType::X => "X",
        }
    }
}

impl fmt::Display for LockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockType {
    type Err = LockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LockType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LockError::UnknownLockType {
                name: s.to_string(),
            })
    }
}
