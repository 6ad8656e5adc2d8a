//! strand Lock Manager Benchmarks
//!
//! This crate contains benchmarks for the strand lock manager:
//! - Uncontended acquire and release
//! - Shared grants piling up on one resource
//! - Queue draining after a release
//! - Hierarchical workloads through lock contexts
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench -p strand-bench
//! ```

pub mod utils;
