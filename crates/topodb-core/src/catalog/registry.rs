//! Sled-backed registry of object-type definitions.

use sled::{Db, Tree};

use super::ObjectTypeDef;
use crate::error::Error;

/// Tree name for object-type definitions.
const OBJECT_TYPE_TREE: &str = "catalog:object_types";

/// Registry of object-type definitions, keyed by object id.
pub struct ObjectTypeRegistry {
    tree: Tree,
}

impl ObjectTypeRegistry {
    /// Open or create the registry using the given sled database.
    pub fn open(db: &Db) -> Result<Self, Error> {
        let tree = db.open_tree(OBJECT_TYPE_TREE)?;
        Ok(Self { tree })
    }

    /// Register an object type, replacing any existing definition with the
    /// same object id.
    ///
    /// Object ids must be non-empty and free of NUL bytes; NUL is the
    /// separator in the constraint store's key layout, so an id containing
    /// one would alias another type's key prefix.
    pub fn register(&self, def: &ObjectTypeDef) -> Result<(), Error> {
        if def.object_id.is_empty() {
            return Err(Error::InvalidArgument(
                "object type id must not be empty".to_string(),
            ));
        }
        if def.object_id.contains('\0') {
            return Err(Error::InvalidArgument(
                "object type id must not contain NUL bytes".to_string(),
            ));
        }

        let value = rkyv::to_bytes::<rkyv::rancor::Error>(def)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        self.tree.insert(def.object_id.as_bytes(), value.to_vec())?;
        Ok(())
    }

    /// Get an object-type definition by id.
    pub fn get(&self, object_id: &str) -> Result<Option<ObjectTypeDef>, Error> {
        match self.tree.get(object_id.as_bytes())? {
            Some(bytes) => {
                let def = rkyv::from_bytes::<ObjectTypeDef, rkyv::rancor::Error>(&bytes)
                    .map_err(|e| Error::Deserialization(e.to_string()))?;
                Ok(Some(def))
            }
            None => Ok(None),
        }
    }

    /// Get an object-type definition, failing if it is not registered.
    pub fn require(&self, object_id: &str) -> Result<ObjectTypeDef, Error> {
        self.get(object_id)?.ok_or_else(|| Error::UnknownObjectType {
            object_id: object_id.to_string(),
        })
    }

    /// Check whether an object type is registered.
    pub fn contains(&self, object_id: &str) -> Result<bool, Error> {
        Ok(self.tree.contains_key(object_id.as_bytes())?)
    }

    /// List all registered object types in id order.
    pub fn list(&self) -> Result<Vec<ObjectTypeDef>, Error> {
        let mut defs = Vec::new();
        for result in self.tree.iter() {
            let (_, value) = result?;
            let def = rkyv::from_bytes::<ObjectTypeDef, rkyv::rancor::Error>(&value)
                .map_err(|e| Error::Deserialization(e.to_string()))?;
            defs.push(def);
        }
        Ok(defs)
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.tree.flush()?;
        Ok(())
    }
}
