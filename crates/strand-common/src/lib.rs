//! # strand-common
//!
//! Common types, errors, and configuration for the strand lock manager.
//!
//! This crate provides the foundational types shared by every strand
//! component. It includes:
//!
//! - **Types**: transaction identifiers (`TxnId`) and hierarchical
//!   resource names (`ResourceName`)
//! - **Errors**: the `LockError` taxonomy with stable error codes
//! - **Config**: lock manager configuration
//! - **Constants**: system-wide defaults
//!
//! ## Example
//!
//! ```rust
//! use strand_common::types::{ResourceName, TxnId};
//! use strand_common::error::LockResult;
//!
//! fn example() -> LockResult<()> {
//!     let txn = TxnId::new(1);
//!     let table = ResourceName::new("database").child("orders");
//!     assert_eq!(table.to_string(), "database/orders");
//!     assert_eq!(txn.to_string(), "1");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use config::LockManagerConfig;
pub use constants::*;
pub use error::{ErrorCode, LockError, LockResult};
pub use types::{LockType, ResourceName, TxnId};
