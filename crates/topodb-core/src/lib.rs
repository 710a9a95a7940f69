//! topodb core - object-type catalog and unique-constraint lifecycle.
//!
//! This crate stores the configuration database's object-type definitions
//! and the uniqueness constraints declared on them, and enforces the
//! constraint lifecycle rules (most importantly: an object type never loses
//! its last unique constraint).

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod catalog;
pub mod error;
pub mod unique;

pub use catalog::{FieldDef, ObjectTypeDef, ObjectTypeRegistry};
pub use error::Error;
pub use unique::{
    CreateUniqueRequest, UniqueConstraint, UniqueLifecycle, UniqueStore, UpdateUniqueRequest,
};
