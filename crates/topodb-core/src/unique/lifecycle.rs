//! Validated lifecycle operations over the unique-constraint store.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use super::constraint::{CreateUniqueRequest, UniqueConstraint, UpdateUniqueRequest};
use super::store::UniqueStore;
use crate::error::Error;

/// Lifecycle manager for unique constraints.
///
/// Stateless apart from a map of per-object-type mutation locks. Deletes
/// racing on the same object type must not both observe a count above one
/// and leave the type with zero constraints, and an update's read-replace
/// must not re-insert a constraint a concurrent delete already removed.
pub struct UniqueLifecycle {
    store: Arc<UniqueStore>,
    type_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl UniqueLifecycle {
    /// Create a lifecycle manager over the given store.
    pub fn new(store: Arc<UniqueStore>) -> Self {
        Self {
            store,
            type_locks: DashMap::new(),
        }
    }

    /// Get the mutation lock for an object type, creating it on first use.
    fn type_lock(&self, object_id: &str) -> Arc<Mutex<()>> {
        self.type_locks
            .entry(object_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Create a unique constraint and return its assigned id.
    pub fn create(&self, object_id: &str, request: &CreateUniqueRequest) -> Result<u64, Error> {
        request.validate()?;
        let id = self
            .store
            .insert(object_id, request.keys.clone(), request.must_check)?;
        debug!(object_id, id, "unique constraint created");
        Ok(id)
    }

    /// Replace the key set and must-check flag of an existing constraint.
    ///
    /// Runs under the object type's mutation lock: the store replace is a
    /// read-then-insert, and without the lock it could re-insert a
    /// constraint a concurrent delete had already removed.
    pub fn update(
        &self,
        object_id: &str,
        id: u64,
        request: &UpdateUniqueRequest,
    ) -> Result<(), Error> {
        request.validate()?;

        let lock = self.type_lock(object_id);
        let _guard = lock.lock();

        self.store
            .replace(object_id, id, request.keys.clone(), request.must_check)?;
        debug!(object_id, id, "unique constraint updated");
        Ok(())
    }

    /// Delete a constraint, refusing to remove the last one of its type.
    ///
    /// Deletes for the same object type are serialized so the count check
    /// and the removal are atomic with respect to each other.
    pub fn delete(&self, object_id: &str, id: u64) -> Result<(), Error> {
        let lock = self.type_lock(object_id);
        let _guard = lock.lock();

        if self.store.get(object_id, id)?.is_none() {
            return Err(Error::NotFound {
                object_id: object_id.to_string(),
                id,
            });
        }

        if self.store.count(object_id)? <= 1 {
            return Err(Error::LastUniqueConstraint {
                object_id: object_id.to_string(),
            });
        }

        self.store.remove(object_id, id)?;
        debug!(object_id, id, "unique constraint deleted");
        Ok(())
    }

    /// List all constraints for an object type in store order.
    ///
    /// An empty result is valid; it only occurs before the type's first
    /// constraint is created.
    pub fn search(&self, object_id: &str) -> Result<Vec<UniqueConstraint>, Error> {
        self.store.list(object_id)
    }
}
