//! Database wrapper combining the object-type registry and constraint store.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use topodb_core::catalog::ObjectTypeRegistry;
use topodb_core::unique::{UniqueLifecycle, UniqueStore};

use crate::error::Error;

/// Database wrapper providing access to the catalog and lifecycle.
pub struct Database {
    registry: Arc<ObjectTypeRegistry>,
    store: Arc<UniqueStore>,
    lifecycle: Arc<UniqueLifecycle>,
    /// Keep the sled handle alive for the trees.
    _db: sled::Db,
}

impl Database {
    /// Open a database at the given path, creating the directory if needed.
    pub fn open(data_path: &Path) -> Result<Self, Error> {
        std::fs::create_dir_all(data_path)?;

        let db = sled::open(data_path).map_err(topodb_core::Error::from)?;
        Self::from_sled(db)
    }

    /// Open an in-memory database, used by tests.
    pub fn open_temporary() -> Result<Self, Error> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(topodb_core::Error::from)?;
        Self::from_sled(db)
    }

    fn from_sled(db: sled::Db) -> Result<Self, Error> {
        let registry = Arc::new(ObjectTypeRegistry::open(&db)?);
        let store = Arc::new(UniqueStore::open(&db, registry.clone())?);
        let lifecycle = Arc::new(UniqueLifecycle::new(store.clone()));

        info!(was_recovered = db.was_recovered(), "database opened");

        Ok(Self {
            registry,
            store,
            lifecycle,
            _db: db,
        })
    }

    /// Get a reference to the object-type registry.
    pub fn registry(&self) -> &ObjectTypeRegistry {
        &self.registry
    }

    /// Get an Arc reference to the constraint lifecycle.
    pub fn lifecycle(&self) -> Arc<UniqueLifecycle> {
        self.lifecycle.clone()
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.registry.flush()?;
        self.store.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topodb_core::catalog::{FieldDef, ObjectTypeDef};
    use topodb_core::CreateUniqueRequest;

    #[test]
    fn test_open_and_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let db = Database::open(dir.path()).unwrap();
            db.registry()
                .register(
                    &ObjectTypeDef::new("host", "Host").with_field(FieldDef::new("ip", "IP")),
                )
                .unwrap();
            db.lifecycle()
                .create("host", &CreateUniqueRequest::new(["ip"]))
                .unwrap();
            db.flush().unwrap();
        }

        {
            let db = Database::open(dir.path()).unwrap();
            assert_eq!(db.lifecycle().search("host").unwrap().len(), 1);
        }
    }
}
