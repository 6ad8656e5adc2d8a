//! The lock manager: bookkeeping of who holds what, and who waits for what.
//!
//! All state lives in a single [`LockTable`] behind one mutex. Every
//! operation takes that mutex, decides atomically whether the request can
//! be granted, mutates the table accordingly, and releases the mutex. The
//! only work done outside it is parking a transaction that has to wait.
//!
//! # Queue Draining
//!
//! Whenever a lock is released, the resource's queue is drained front to
//! back. Each admissible request is replayed through the same grant path a
//! live call uses, which may release further locks and drain further
//! queues. Draining stops at the first request that cannot be granted:
//!
//! ```text
//!   held: X(A)@T0        queue: S(A)@T1  X(A)@T2  S(A)@T3
//!   release X(A)@T0  →   held: S(A)@T1   queue: X(A)@T2  S(A)@T3
//! ```
//!
//! S(A)@T3 stays queued even though it is compatible with S(A)@T1.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use parking_lot::Mutex;
use strand_common::config::LockManagerConfig;
use strand_common::constants::RESOURCE_SEPARATOR;
use strand_common::error::{LockError, LockResult};
use strand_common::types::{LockType, ResourceName, TxnId};
use tracing::{debug, trace, warn};

use super::entry::{QueuePosition, ResourceEntry};
use super::record::{Lock, LockRequest};
use crate::context::LockContext;
use crate::transaction::TransactionRef;

/// Statistics about the lock manager.
#[derive(Debug, Default)]
pub struct LockStats {
    /// Locks granted, immediately or from a queue.
    pub acquisitions: AtomicU64,
    /// Locks released.
    pub releases: AtomicU64,
    /// Requests that had to wait.
    pub waits: AtomicU64,
    /// Locks promoted in place.
    pub promotions: AtomicU64,
    /// Requests granted while draining a queue.
    pub queue_grants: AtomicU64,
}

impl LockStats {
    /// Creates new stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a granted lock.
    pub fn record_acquisition(&self) {
        self.acquisitions.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Records a release.
    pub fn record_release(&self) {
        self.releases.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Records a wait.
    pub fn record_wait(&self) {
        self.waits.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Records a promotion.
    pub fn record_promotion(&self) {
        self.promotions.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Records a grant made while draining a queue.
    pub fn record_queue_grant(&self) {
        self.queue_grants.fetch_add(1, AtomicOrdering::Relaxed);
    }
}

/// Everything guarded by the lock manager's mutex.
#[derive(Debug)]
struct LockTable {
    /// Locks held by each transaction, in acquisition order.
    txn_locks: HashMap<TxnId, Vec<Lock>>,
    /// Per-resource grants and wait queues.
    resources: HashMap<ResourceName, ResourceEntry>,
}

impl LockTable {
    fn with_capacity(resources: usize, txns: usize) -> Self {
        Self {
            txn_locks: HashMap::with_capacity(txns),
            resources: HashMap::with_capacity(resources),
        }
    }

    /// Returns the entry for `name`, creating it on first reference.
    fn entry_mut(&mut self, name: &ResourceName) -> &mut ResourceEntry {
        self.resources.entry(name.clone()).or_default()
    }

    /// Returns the lock `txn_id` holds on `name`, if any.
    fn held_lock(&self, txn_id: TxnId, name: &ResourceName) -> Option<&Lock> {
        self.txn_locks
            .get(&txn_id)?
            .iter()
            .find(|lock| &lock.name == name)
    }

    fn held_lock_type(&self, txn_id: TxnId, name: &ResourceName) -> LockType {
        self.held_lock(txn_id, name)
            .map_or(LockType::NL, |lock| lock.lock_type)
    }

    /// Records `lock` as granted in both maps, replacing the owner's
    /// existing lock on the resource in place if there is one.
    fn grant(&mut self, lock: Lock) {
        let held = self.txn_locks.entry(lock.txn_id).or_default();
        match held.iter_mut().find(|held| held.name == lock.name) {
            Some(existing) => existing.lock_type = lock.lock_type,
            None => held.push(lock.clone()),
        }
        self.entry_mut(&lock.name).grant_or_update(lock);
    }

    /// Removes a granted lock from both maps. Does not drain the queue.
    fn remove(&mut self, lock: &Lock) {
        if let Some(held) = self.txn_locks.get_mut(&lock.txn_id) {
            held.retain(|held| held.name != lock.name);
        }
        self.entry_mut(&lock.name).release(lock);
    }

    /// Checks the lock table invariants, returning the first violation.
    fn verify(&self) -> Result<(), String> {
        let mut granted = 0usize;
        for (name, entry) in &self.resources {
            let grants = entry.grants();
            granted += grants.len();
            for (i, lock) in grants.iter().enumerate() {
                if &lock.name != name {
                    return Err(format!("{} is filed under {}", lock, name));
                }
                for other in &grants[i + 1..] {
                    if other.txn_id == lock.txn_id {
                        return Err(format!("{} and {} held by one transaction", lock, other));
                    }
                    if !lock.lock_type.compatible(other.lock_type) {
                        return Err(format!("{} and {} are incompatible", lock, other));
                    }
                }
                let mirrored = self
                    .txn_locks
                    .get(&lock.txn_id)
                    .is_some_and(|held| held.contains(lock));
                if !mirrored {
                    return Err(format!("{} missing from its transaction's locks", lock));
                }
            }
        }

        let held: usize = self.txn_locks.values().map(Vec::len).sum();
        if held != granted {
            return Err(format!(
                "{} locks held by transactions but {} granted on resources",
                held, granted
            ));
        }
        Ok(())
    }
}

/// The lock manager for tracking transaction locks.
pub struct LockManager {
    /// All lock state.
    table: Mutex<LockTable>,
    /// Lock contexts, by root-level name.
    contexts: Mutex<HashMap<String, Arc<LockContext>>>,
    /// Configuration.
    config: LockManagerConfig,
    /// Statistics.
    stats: LockStats,
}

impl LockManager {
    /// Creates a new lock manager with default configuration.
    pub fn new() -> Self {
        Self::build(LockManagerConfig::default())
    }

    /// Creates a lock manager with custom configuration.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid; see [`Self::try_with_config`].
    pub fn with_config(config: LockManagerConfig) -> Self {
        match Self::try_with_config(config) {
            Ok(manager) => manager,
            Err(e) => panic!("{}", e),
        }
    }

    /// Creates a lock manager after validating `config`.
    pub fn try_with_config(config: LockManagerConfig) -> LockResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: LockManagerConfig) -> Self {
        Self {
            table: Mutex::new(LockTable::with_capacity(
                config.resource_capacity,
                config.txn_capacity,
            )),
            contexts: Mutex::new(HashMap::new()),
            config,
            stats: LockStats::new(),
        }
    }

    /// Acquires a `lock_type` lock on `name` for `txn`.
    ///
    /// Granted at once when nobody is queued on `name` and the lock is
    /// compatible with every granted lock. Otherwise the request joins the
    /// back of the queue and `txn` blocks until it is granted.
    ///
    /// # Errors
    ///
    /// [`LockError::DuplicateRequest`] if `txn` already holds a lock on `name`.
    pub fn acquire(
        &self,
        txn: &TransactionRef,
        name: &ResourceName,
        lock_type: LockType,
    ) -> LockResult<()> {
        let txn_id = txn.id();
        let should_block = {
            let mut table = self.table.lock();

            if let Some(held) = table.held_lock(txn_id, name) {
                return Err(LockError::DuplicateRequest {
                    txn_id,
                    resource: name.clone(),
                    lock_type: held.lock_type,
                });
            }

            let lock = Lock::new(name.clone(), lock_type, txn_id);
            let grantable = {
                let entry = table.entry_mut(name);
                entry.is_queue_empty() && entry.check_compatible(lock_type, None)
            };

            let should_block = if grantable {
                self.grant_and_release(&mut table, lock, &[]);
                false
            } else {
                debug!("transaction {} waits for {} on {}", txn_id, lock_type, name);
                txn.prepare_block();
                table
                    .entry_mut(name)
                    .enqueue(LockRequest::new(Arc::clone(txn), lock), QueuePosition::Back);
                self.stats.record_wait();
                true
            };

            self.check_invariants(&table);
            should_block
        };

        if should_block {
            txn.block();
        }
        Ok(())
    }

    /// Acquires `lock_type` on `name` and releases `txn`'s locks on every
    /// resource in `release_names`, as one atomic step.
    ///
    /// The new lock is granted first; the releases follow and their queues
    /// are drained. If the new lock conflicts with another transaction's
    /// lock, the request goes to the front of the queue and `txn` blocks;
    /// nothing is released until the grant happens. Replacing a lock `txn`
    /// already holds on `name` keeps that lock's acquisition position.
    /// Naming `name` itself in `release_names` does not release the new lock.
    ///
    /// # Errors
    ///
    /// - [`LockError::DuplicateRequest`] if `txn` holds a lock on `name` and
    ///   `name` is not being released.
    /// - [`LockError::NoLockHeld`] if `txn` holds no lock on some resource in
    ///   `release_names` (other than `name`).
    pub fn acquire_and_release(
        &self,
        txn: &TransactionRef,
        name: &ResourceName,
        lock_type: LockType,
        release_names: &[ResourceName],
    ) -> LockResult<()> {
        let txn_id = txn.id();
        let release_names = dedup(release_names);
        let should_block = {
            let mut table = self.table.lock();

            if let Some(held) = table.held_lock(txn_id, name) {
                if !release_names.contains(name) {
                    return Err(LockError::DuplicateRequest {
                        txn_id,
                        resource: name.clone(),
                        lock_type: held.lock_type,
                    });
                }
            }

            let mut releasing = Vec::with_capacity(release_names.len());
            for release_name in &release_names {
                match table.held_lock(txn_id, release_name) {
                    Some(held) => releasing.push(held.clone()),
                    None if release_name == name => {}
                    None => {
                        return Err(LockError::NoLockHeld {
                            txn_id,
                            resource: release_name.clone(),
                        })
                    }
                }
            }

            let lock = Lock::new(name.clone(), lock_type, txn_id);
            let grantable = table.entry_mut(name).check_compatible(lock_type, Some(txn_id));

            let should_block = if grantable {
                self.grant_and_release(&mut table, lock, &release_names);
                false
            } else {
                debug!(
                    "transaction {} waits for {} on {} (releasing {})",
                    txn_id,
                    lock_type,
                    name,
                    releasing.len()
                );
                if !txn.is_blocked() {
                    txn.prepare_block();
                }
                let request = LockRequest::with_release(Arc::clone(txn), lock, releasing);
                table.entry_mut(name).enqueue(request, QueuePosition::Front);
                self.stats.record_wait();
                true
            };

            self.check_invariants(&table);
            should_block
        };

        if should_block {
            txn.block();
        }
        Ok(())
    }

    /// Releases `txn`'s lock on `name` and drains the queue on `name`.
    ///
    /// # Errors
    ///
    /// [`LockError::NoLockHeld`] if `txn` holds no lock on `name`.
    pub fn release(&self, txn: &TransactionRef, name: &ResourceName) -> LockResult<()> {
        let txn_id = txn.id();
        let mut table = self.table.lock();

        let lock = table
            .held_lock(txn_id, name)
            .cloned()
            .ok_or_else(|| LockError::NoLockHeld {
                txn_id,
                resource: name.clone(),
            })?;

        self.release_lock(&mut table, &lock);
        self.check_invariants(&table);
        Ok(())
    }

    /// Releases every lock `txn` holds, newest first.
    ///
    /// Returns the number of locks released. This is the abort path of the
    /// surrounding transaction layer.
    pub fn release_all(&self, txn: &TransactionRef) -> usize {
        let txn_id = txn.id();
        let mut table = self.table.lock();

        let held = table.txn_locks.get(&txn_id).cloned().unwrap_or_default();
        for lock in held.iter().rev() {
            self.release_lock(&mut table, lock);
        }

        self.check_invariants(&table);
        held.len()
    }

    /// Promotes `txn`'s lock on `name` to `new_type`, keeping its
    /// acquisition position.
    ///
    /// If `new_type` conflicts with another transaction's lock, the request
    /// goes to the front of the queue and `txn` blocks.
    ///
    /// # Errors
    ///
    /// - [`LockError::DuplicateRequest`] if `txn` already holds `new_type`.
    /// - [`LockError::NoLockHeld`] if `txn` holds no lock on `name`.
    /// - [`LockError::InvalidLock`] unless `new_type` is substitutable for
    ///   the held type and differs from it.
    pub fn promote(
        &self,
        txn: &TransactionRef,
        name: &ResourceName,
        new_type: LockType,
    ) -> LockResult<()> {
        let txn_id = txn.id();
        let should_block = {
            let mut table = self.table.lock();

            let held = table.held_lock_type(txn_id, name);
            if held == new_type {
                return Err(LockError::DuplicateRequest {
                    txn_id,
                    resource: name.clone(),
                    lock_type: held,
                });
            }
            if held == LockType::NL {
                return Err(LockError::NoLockHeld {
                    txn_id,
                    resource: name.clone(),
                });
            }
            if !new_type.substitutable(held) {
                return Err(LockError::InvalidLock {
                    txn_id,
                    resource: name.clone(),
                    from: held,
                    to: new_type,
                });
            }

            let lock = Lock::new(name.clone(), new_type, txn_id);
            let grantable = table.entry_mut(name).check_compatible(new_type, Some(txn_id));

            let should_block = if grantable {
                debug!("transaction {} promoted {} to {} on {}", txn_id, held, new_type, name);
                table.grant(lock);
                self.stats.record_promotion();
                false
            } else {
                debug!("transaction {} waits to promote {} to {} on {}", txn_id, held, new_type, name);
                txn.prepare_block();
                let old = Lock::new(name.clone(), held, txn_id);
                let request = LockRequest::with_release(Arc::clone(txn), lock, vec![old]);
                table.entry_mut(name).enqueue(request, QueuePosition::Front);
                self.stats.record_wait();
                true
            };

            self.check_invariants(&table);
            should_block
        };

        if should_block {
            txn.block();
        }
        Ok(())
    }

    /// Returns the lock type `txn_id` holds on `name`, or NL.
    pub fn get_lock_type(&self, txn_id: TxnId, name: &ResourceName) -> LockType {
        self.table.lock().held_lock_type(txn_id, name)
    }

    /// Returns the locks granted on `name`, in acquisition order.
    pub fn get_locks(&self, name: &ResourceName) -> Vec<Lock> {
        self.table
            .lock()
            .resources
            .get(name)
            .map(|entry| entry.grants().to_vec())
            .unwrap_or_default()
    }

    /// Returns the locks held by `txn_id`, in acquisition order.
    pub fn get_txn_locks(&self, txn_id: TxnId) -> Vec<Lock> {
        self.table
            .lock()
            .txn_locks
            .get(&txn_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the locks waiting on `name`, front of the queue first.
    pub fn waiting_on(&self, name: &ResourceName) -> Vec<Lock> {
        self.table
            .lock()
            .resources
            .get(name)
            .map(|entry| entry.queued().map(|request| request.lock.clone()).collect())
            .unwrap_or_default()
    }

    /// Returns the number of resources ever referenced.
    pub fn resource_count(&self) -> usize {
        self.table.lock().resources.len()
    }

    /// Returns the number of transactions ever granted a lock.
    pub fn txn_count(&self) -> usize {
        self.table.lock().txn_locks.len()
    }

    /// Checks the lock table invariants.
    ///
    /// Every pair of locks granted on a resource to different transactions
    /// is compatible, no transaction holds two locks on one resource, and
    /// the per-transaction lists mirror the per-resource grants exactly.
    pub fn verify_invariants(&self) -> Result<(), String> {
        self.table.lock().verify()
    }

    /// Returns the lock context for `name`.
    ///
    /// A path such as `database/orders` resolves through the root context's
    /// children, so it names the same resource as the parsed path. Empty
    /// segments are skipped. The same name always yields the same context.
    pub fn context(&self, name: &str) -> Arc<LockContext> {
        let mut segments = name.split(RESOURCE_SEPARATOR);
        let root = segments.next().unwrap_or_default();
        let context = {
            let mut contexts = self.contexts.lock();
            Arc::clone(
                contexts
                    .entry(root.to_string())
                    .or_insert_with(|| Arc::new(LockContext::root(ResourceName::new(root)))),
            )
        };
        segments
            .filter(|segment| !segment.is_empty())
            .fold(context, |parent, segment| parent.child(segment))
    }

    /// Returns the lock context for the database (the configured root).
    pub fn database_context(&self) -> Arc<LockContext> {
        self.context(&self.config.root_context)
    }

    /// Returns statistics about the lock manager.
    pub fn stats(&self) -> &LockStats {
        &self.stats
    }

    /// Returns the configuration.
    pub fn config(&self) -> &LockManagerConfig {
        &self.config
    }

    /// Grants `lock`, then releases the owner's locks on `release_names`
    /// and drains their queues.
    ///
    /// This is the single grant path: live requests that passed their
    /// checks and queued requests being replayed both end up here.
    fn grant_and_release(&self, table: &mut LockTable, lock: Lock, release_names: &[ResourceName]) {
        let txn_id = lock.txn_id;
        let name = lock.name.clone();
        let previous = table.held_lock_type(txn_id, &name);
        let lock_type = lock.lock_type;

        debug!("transaction {} granted {} on {}", txn_id, lock_type, name);
        table.grant(lock);
        self.stats.record_acquisition();

        for release_name in release_names {
            if release_name == &name {
                continue;
            }
            match table.held_lock(txn_id, release_name).cloned() {
                Some(old) => self.release_lock(table, &old),
                None => warn!(
                    "transaction {} no longer holds a lock on {}; skipping release",
                    txn_id, release_name
                ),
            }
        }

        // A replacement that weakened the lock on `name` may admit waiters.
        if previous != LockType::NL && !lock_type.substitutable(previous) {
            self.process_queue(table, &name);
        }
    }

    fn release_lock(&self, table: &mut LockTable, lock: &Lock) {
        debug!("transaction {} released {} on {}", lock.txn_id, lock.lock_type, lock.name);
        table.remove(lock);
        self.stats.record_release();
        self.process_queue(table, &lock.name);
    }

    /// Grants queued requests on `name` from the front until one cannot be
    /// granted, waking each owner after its grant.
    fn process_queue(&self, table: &mut LockTable, name: &ResourceName) {
        while let Some(request) = table.entry_mut(name).pop_admissible() {
            trace!("replaying {} from the queue on {}", request, name);
            let release_names = request.release_names();
            self.grant_and_release(table, request.lock.clone(), &release_names);
            self.stats.record_queue_grant();
            request.transaction.unblock();
        }
    }

    fn check_invariants(&self, table: &LockTable) {
        if !self.config.check_invariants {
            return;
        }
        if let Err(violation) = table.verify() {
            panic!("lock table invariant violated: {}", violation);
        }
    }
}

/// Removes repeated names, keeping first occurrences in order.
fn dedup(names: &[ResourceName]) -> Vec<ResourceName> {
    let mut unique: Vec<ResourceName> = Vec::with_capacity(names.len());
    for name in names {
        if !unique.contains(name) {
            unique.push(name.clone());
        }
    }
    unique
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LockManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockManager")
            .field("resource_count", &self.resource_count())
            .field("txn_count", &self.txn_count())
            .finish()
    }
}
