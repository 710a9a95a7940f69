//! Object-type catalog.
//!
//! Stores the object-type definitions that unique constraints attach to.

mod object_type;
mod registry;

pub use object_type::{FieldDef, ObjectTypeDef};
pub use registry::ObjectTypeRegistry;
