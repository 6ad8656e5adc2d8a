//! Lock contexts: named handles onto the resource hierarchy.
//!
//! A context pairs a resource name with its place in the hierarchy. Contexts
//! are identity-mapped: asking for the same name twice yields the same
//! `Arc`. They do not own the lock manager; the delegating helpers take it
//! as an argument, so the registry stays outside the lock table's critical
//! section and free of reference cycles.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use strand_common::error::LockResult;
use strand_common::types::{LockType, ResourceName};

use crate::lock::LockManager;
use crate::transaction::TransactionRef;

/// A named node in the resource hierarchy.
pub struct LockContext {
    name: ResourceName,
    parent: Option<Arc<LockContext>>,
    children: Mutex<HashMap<String, Arc<LockContext>>>,
}

impl LockContext {
    /// Creates a root context. Use [`LockManager::context`] to get an
    /// identity-mapped one.
    pub(crate) fn root(name: ResourceName) -> Self {
        Self {
            name,
            parent: None,
            children: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the child context `segment`, creating it on first use.
    pub fn child(self: &Arc<Self>, segment: &str) -> Arc<LockContext> {
        let mut children = self.children.lock();
        Arc::clone(children.entry(segment.to_string()).or_insert_with(|| {
            Arc::new(LockContext {
                name: self.name.child(segment),
                parent: Some(Arc::clone(self)),
                children: Mutex::new(HashMap::new()),
            })
        }))
    }

    /// Returns the resource name of this context.
    pub fn name(&self) -> &ResourceName {
        &self.name
    }

    /// Returns the parent context, or `None` at the root.
    pub fn parent(&self) -> Option<&Arc<LockContext>> {
        self.parent.as_ref()
    }

    /// Acquires `lock_type` on this resource for `txn`.
    pub fn acquire(
        &self,
        manager: &LockManager,
        txn: &TransactionRef,
        lock_type: LockType,
    ) -> LockResult<()> {
        manager.acquire(txn, &self.name, lock_type)
    }

    /// Releases `txn`'s lock on this resource.
    pub fn release(&self, manager: &LockManager, txn: &TransactionRef) -> LockResult<()> {
        manager.release(txn, &self.name)
    }

    /// Promotes `txn`'s lock on this resource to `new_type`.
    pub fn promote(
        &self,
        manager: &LockManager,
        txn: &TransactionRef,
        new_type: LockType,
    ) -> LockResult<()> {
        manager.promote(txn, &self.name, new_type)
    }

    /// Returns the lock type `txn` holds on this resource.
    pub fn lock_type(&self, manager: &LockManager, txn: &TransactionRef) -> LockType {
        manager.get_lock_type(txn.id(), &self.name)
    }
}

impl fmt::Debug for LockContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockContext")
            .field("name", &self.name)
            .field("children", &self.children.lock().len())
            .finish()
    }
}
