//! Sled-backed storage for unique-constraint definitions.
//!
//! Constraints are keyed by `object_id \0 id_be_bytes`, so listing the
//! constraints of one object type is a prefix scan and an update or delete
//! that claims the wrong object type simply does not resolve.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sled::{Db, Tree};

use super::constraint::UniqueConstraint;
use crate::catalog::ObjectTypeRegistry;
use crate::error::Error;

/// Tree name for constraint records.
const CONSTRAINT_TREE: &str = "unique:constraints";

/// Tree name for store metadata.
const META_TREE: &str = "unique:meta";

/// Key for the last assigned constraint id in the meta tree.
const LAST_ID_KEY: &[u8] = b"last_id";

/// Durable store of unique-constraint definitions.
pub struct UniqueStore {
    constraint_tree: Tree,
    meta_tree: Tree,
    registry: Arc<ObjectTypeRegistry>,
    /// Last assigned constraint id (cached).
    last_id: AtomicU64,
}

impl UniqueStore {
    /// Open or create the store using the given sled database.
    ///
    /// The registry is consulted on insert and replace to validate that
    /// constraint keys name real properties of the target object type.
    pub fn open(db: &Db, registry: Arc<ObjectTypeRegistry>) -> Result<Self, Error> {
        let constraint_tree = db.open_tree(CONSTRAINT_TREE)?;
        let meta_tree = db.open_tree(META_TREE)?;

        let last_id = match meta_tree.get(LAST_ID_KEY)? {
            Some(bytes) => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&bytes);
                u64::from_be_bytes(buf)
            }
            None => 0,
        };

        Ok(Self {
            constraint_tree,
            meta_tree,
            registry,
            last_id: AtomicU64::new(last_id),
        })
    }

    /// Build the storage key for a constraint.
    fn build_key(object_id: &str, id: u64) -> Vec<u8> {
        // Format: object_id\0id_be_bytes
        let mut key = Vec::with_capacity(object_id.len() + 9);
        key.extend_from_slice(object_id.as_bytes());
        key.push(0);
        key.extend_from_slice(&id.to_be_bytes());
        key
    }

    /// Build the prefix covering all constraints of an object type.
    fn build_prefix(object_id: &str) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(object_id.len() + 1);
        prefix.extend_from_slice(object_id.as_bytes());
        prefix.push(0);
        prefix
    }

    /// Assign the next constraint id and persist the counter.
    ///
    /// The persisted value only ever moves forward: with concurrent
    /// assignments the thread holding the larger id may reach the meta tree
    /// first, and a plain overwrite would let the smaller id regress the
    /// counter, handing out an already-used id after reopen.
    fn next_id(&self) -> Result<u64, Error> {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.meta_tree.update_and_fetch(LAST_ID_KEY, |old| {
            let persisted = old
                .and_then(|bytes| bytes.try_into().ok())
                .map(u64::from_be_bytes)
                .unwrap_or(0);
            Some(persisted.max(id).to_be_bytes().to_vec())
        })?;
        Ok(id)
    }

    /// Validate constraint keys against the object-type definition.
    fn validate_fields(&self, object_id: &str, keys: &[String]) -> Result<(), Error> {
        let def = self.registry.require(object_id)?;
        for key in keys {
            if !def.has_field(key) {
                return Err(Error::UnknownField {
                    object_id: object_id.to_string(),
                    key: key.clone(),
                });
            }
        }
        Ok(())
    }

    /// Insert a new constraint and return its assigned id.
    ///
    /// Fails if the object type is unknown, a key names a missing property,
    /// or a constraint with the same key set already exists on the type.
    pub fn insert(
        &self,
        object_id: &str,
        keys: Vec<String>,
        must_check: bool,
    ) -> Result<u64, Error> {
        self.validate_fields(object_id, &keys)?;

        for existing in self.list(object_id)? {
            if existing.keys == keys {
                return Err(Error::DuplicateUniqueConstraint {
                    object_id: object_id.to_string(),
                });
            }
        }

        let id = self.next_id()?;
        let constraint = UniqueConstraint {
            id,
            object_id: object_id.to_string(),
            keys,
            must_check,
        };

        let key = Self::build_key(object_id, id);
        self.constraint_tree.insert(key, constraint.to_bytes()?)?;
        Ok(id)
    }

    /// Replace the mutable parts of an existing constraint.
    ///
    /// Fails NotFound if the id does not exist under the claimed object type.
    pub fn replace(
        &self,
        object_id: &str,
        id: u64,
        keys: Vec<String>,
        must_check: bool,
    ) -> Result<(), Error> {
        self.validate_fields(object_id, &keys)?;

        let current = self.get(object_id, id)?.ok_or_else(|| Error::NotFound {
            object_id: object_id.to_string(),
            id,
        })?;

        for existing in self.list(object_id)? {
            if existing.id != id && existing.keys == keys {
                return Err(Error::DuplicateUniqueConstraint {
                    object_id: object_id.to_string(),
                });
            }
        }

        let replacement = UniqueConstraint {
            id: current.id,
            object_id: current.object_id,
            keys,
            must_check,
        };

        let key = Self::build_key(object_id, id);
        self.constraint_tree.insert(key, replacement.to_bytes()?)?;
        Ok(())
    }

    /// Remove a constraint.
    ///
    /// Fails NotFound if the id does not exist under the claimed object type.
    pub fn remove(&self, object_id: &str, id: u64) -> Result<(), Error> {
        let key = Self::build_key(object_id, id);
        match self.constraint_tree.remove(key)? {
            Some(_) => Ok(()),
            None => Err(Error::NotFound {
                object_id: object_id.to_string(),
                id,
            }),
        }
    }

    /// Get a constraint by object type and id.
    pub fn get(&self, object_id: &str, id: u64) -> Result<Option<UniqueConstraint>, Error> {
        let key = Self::build_key(object_id, id);
        match self.constraint_tree.get(key)? {
            Some(bytes) => Ok(Some(UniqueConstraint::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// List all constraints for an object type in id order.
    pub fn list(&self, object_id: &str) -> Result<Vec<UniqueConstraint>, Error> {
        let mut constraints = Vec::new();
        for result in self.constraint_tree.scan_prefix(Self::build_prefix(object_id)) {
            let (_, value) = result?;
            constraints.push(UniqueConstraint::from_bytes(&value)?);
        }
        Ok(constraints)
    }

    /// Count the constraints for an object type.
    pub fn count(&self, object_id: &str) -> Result<usize, Error> {
        Ok(self
            .constraint_tree
            .scan_prefix(Self::build_prefix(object_id))
            .count())
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.constraint_tree.flush()?;
        self.meta_tree.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldDef, ObjectTypeDef};

    fn test_store() -> UniqueStore {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let registry = Arc::new(ObjectTypeRegistry::open(&db).unwrap());
        registry
            .register(
                &ObjectTypeDef::new("host", "Host")
                    .with_field(FieldDef::new("ip", "Inner IP"))
                    .with_field(FieldDef::new("mac", "MAC Address"))
                    .with_field(FieldDef::new("cloud_id", "Cloud Area")),
            )
            .unwrap();
        UniqueStore::open(&db, registry).unwrap()
    }

    fn keys(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let store = test_store();

        let id1 = store.insert("host", keys(&["ip"]), true).unwrap();
        let id2 = store.insert("host", keys(&["mac"]), true).unwrap();

        assert!(id2 > id1);
    }

    #[test]
    fn test_insert_unknown_object_type() {
        let store = test_store();

        let err = store.insert("switch", keys(&["sn"]), true).unwrap_err();
        assert!(matches!(err, Error::UnknownObjectType { .. }));
    }

    #[test]
    fn test_insert_unknown_field() {
        let store = test_store();

        let err = store.insert("host", keys(&["serial"]), true).unwrap_err();
        assert!(matches!(err, Error::UnknownField { ref key, .. } if key == "serial"));
    }

    #[test]
    fn test_insert_duplicate_key_set() {
        let store = test_store();

        store.insert("host", keys(&["ip", "cloud_id"]), true).unwrap();
        let err = store
            .insert("host", keys(&["ip", "cloud_id"]), true)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateUniqueConstraint { .. }));
    }

    #[test]
    fn test_replace_and_get() {
        let store = test_store();

        let id = store.insert("host", keys(&["ip"]), true).unwrap();
        store.replace("host", id, keys(&["ip", "cloud_id"]), false).unwrap();

        let constraint = store.get("host", id).unwrap().unwrap();
        assert_eq!(constraint.id, id);
        assert_eq!(constraint.object_id, "host");
        assert_eq!(constraint.keys, keys(&["ip", "cloud_id"]));
        assert!(!constraint.must_check);
    }

    #[test]
    fn test_replace_wrong_object_type() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let registry = Arc::new(ObjectTypeRegistry::open(&db).unwrap());
        registry
            .register(&ObjectTypeDef::new("host", "Host").with_field(FieldDef::new("ip", "IP")))
            .unwrap();
        registry
            .register(
                &ObjectTypeDef::new("switch", "Switch").with_field(FieldDef::new("sn", "SN")),
            )
            .unwrap();
        let store = UniqueStore::open(&db, registry).unwrap();

        let id = store.insert("host", keys(&["ip"]), true).unwrap();

        // The id exists, but under "host", not "switch".
        let err = store.replace("switch", id, keys(&["sn"]), true).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_remove_not_found() {
        let store = test_store();

        let err = store.remove("host", 42).unwrap_err();
        assert!(matches!(err, Error::NotFound { id: 42, .. }));
    }

    #[test]
    fn test_list_scoped_to_object_type() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let registry = Arc::new(ObjectTypeRegistry::open(&db).unwrap());
        registry
            .register(&ObjectTypeDef::new("host", "Host").with_field(FieldDef::new("ip", "IP")))
            .unwrap();
        registry
            .register(
                &ObjectTypeDef::new("switch", "Switch").with_field(FieldDef::new("sn", "SN")),
            )
            .unwrap();
        let store = UniqueStore::open(&db, registry).unwrap();

        store.insert("host", keys(&["ip"]), true).unwrap();
        store.insert("switch", keys(&["sn"]), true).unwrap();

        let host_uniques = store.list("host").unwrap();
        assert_eq!(host_uniques.len(), 1);
        assert_eq!(host_uniques[0].object_id, "host");

        assert_eq!(store.count("switch").unwrap(), 1);
        assert_eq!(store.count("router").unwrap(), 0);
    }

    #[test]
    fn test_concurrent_inserts_keep_ids_unique_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = sled::Config::new().path(dir.path());

        let fields: Vec<FieldDef> = (0..8)
            .map(|i| FieldDef::new(format!("f{i}"), format!("Field {i}")))
            .collect();

        let max_id;
        {
            let db = config.clone().open().unwrap();
            let registry = Arc::new(ObjectTypeRegistry::open(&db).unwrap());
            registry
                .register(&ObjectTypeDef::new("host", "Host").with_fields(fields.clone()))
                .unwrap();
            let store = Arc::new(UniqueStore::open(&db, registry).unwrap());

            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let store = store.clone();
                    std::thread::spawn(move || {
                        store.insert("host", vec![format!("f{i}")], true).unwrap()
                    })
                })
                .collect();

            let mut ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            ids.sort_unstable();
            max_id = ids[ids.len() - 1];
            ids.dedup();
            assert_eq!(ids.len(), 8, "concurrent inserts reused an id");

            store.flush().unwrap();
        }

        // The persisted counter must not have regressed below any id already
        // handed out, or the next insert would overwrite a live constraint.
        {
            let db = config.open().unwrap();
            let registry = Arc::new(ObjectTypeRegistry::open(&db).unwrap());
            let store = UniqueStore::open(&db, registry).unwrap();

            assert_eq!(store.count("host").unwrap(), 8);
            let next = store
                .insert("host", keys(&["f0", "f1"]), true)
                .unwrap();
            assert!(next > max_id);
            assert_eq!(store.count("host").unwrap(), 9);
        }
    }

    #[test]
    fn test_id_counter_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = sled::Config::new().path(dir.path());

        let last_id;
        {
            let db = config.clone().open().unwrap();
            let registry = Arc::new(ObjectTypeRegistry::open(&db).unwrap());
            registry
                .register(
                    &ObjectTypeDef::new("host", "Host")
                        .with_field(FieldDef::new("ip", "IP"))
                        .with_field(FieldDef::new("mac", "MAC")),
                )
                .unwrap();
            let store = UniqueStore::open(&db, registry).unwrap();
            last_id = store.insert("host", keys(&["ip"]), true).unwrap();
            store.flush().unwrap();
        }

        {
            let db = config.open().unwrap();
            let registry = Arc::new(ObjectTypeRegistry::open(&db).unwrap());
            let store = UniqueStore::open(&db, registry).unwrap();

            let next = store.insert("host", keys(&["mac"]), true).unwrap();
            assert!(next > last_id);
            assert_eq!(store.count("host").unwrap(), 2);
        }
    }
}
