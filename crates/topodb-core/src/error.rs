//! Core error types.

use thiserror::Error;

/// Core catalog and lifecycle errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Malformed request payload.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Constraint id does not exist for the claimed object type.
    #[error("unique constraint {id} not found on object type '{object_id}'")]
    NotFound {
        /// Object type the caller claimed the constraint belongs to.
        object_id: String,
        /// Constraint id.
        id: u64,
    },

    /// Deleting would leave the object type with zero unique constraints.
    #[error("object type '{object_id}' must retain at least one unique constraint")]
    LastUniqueConstraint {
        /// Object type whose last constraint was targeted.
        object_id: String,
    },

    /// Object type is not registered in the catalog.
    #[error("unknown object type '{object_id}'")]
    UnknownObjectType {
        /// The unregistered object type id.
        object_id: String,
    },

    /// A constraint key names a property the object type does not have.
    #[error("object type '{object_id}' has no property '{key}'")]
    UnknownField {
        /// Object type the constraint targets.
        object_id: String,
        /// The unknown property id.
        key: String,
    },

    /// A constraint with the same key set already exists.
    #[error("object type '{object_id}' already has a unique constraint on these keys")]
    DuplicateUniqueConstraint {
        /// Object type the constraint targets.
        object_id: String,
    },
}

impl Error {
    /// Whether this error is the non-emptiness invariant rejection.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Error::LastUniqueConstraint { .. })
    }

    /// Whether this error means the referenced constraint does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
