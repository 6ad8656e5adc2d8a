//! # strand-test
//!
//! Integration tests for the strand lock manager.
//!
//! This crate contains:
//! - Multi-threaded tests against parked transactions
//! - Seeded workload generators
//! - Correctness verification helpers

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Test utilities and helpers
pub mod utils;

/// Workload generators
pub mod workload;
