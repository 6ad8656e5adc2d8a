//! Test utilities and helpers.

use std::thread;
use std::time::{Duration, Instant};

use strand_common::ROOT_RESOURCE_NAME;
use strand_txn::{LockManager, LockManagerConfig, ResourceName, TransactionRef};
use tracing_subscriber::EnvFilter;

/// How long a test waits for another thread before giving up.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Installs a tracing subscriber for the current test binary.
///
/// Honors `RUST_LOG`; defaults to warnings only. Safe to call from every
/// test, only the first call installs.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Creates a lock manager that verifies its invariants after every call.
pub fn test_manager() -> LockManager {
    LockManager::with_config(LockManagerConfig::for_testing())
}

/// Returns `database/<table>`.
pub fn table(name: &str) -> ResourceName {
    ResourceName::new(ROOT_RESOURCE_NAME).child(name)
}

/// Returns `database/<table>/<row>`.
pub fn row(table_name: &str, row: usize) -> ResourceName {
    table(table_name).child(&row.to_string())
}

/// Polls `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// Waits until `txn` has been queued by the lock manager.
pub fn wait_until_blocked(txn: &TransactionRef) -> bool {
    wait_until(WAIT_TIMEOUT, || txn.is_blocked())
}
