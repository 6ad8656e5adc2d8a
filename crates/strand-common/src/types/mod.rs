//! Type definitions for strand.
//!
//! This module contains the core vocabulary shared by the lock manager and
//! its callers.

mod ids;
mod lock_type;
mod resource;

pub use ids::TxnId;
pub use lock_type::LockType;
pub use resource::ResourceName;
