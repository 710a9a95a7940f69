//! Unique-constraint definitions and lifecycle.
//!
//! A unique constraint declares that a set of properties on an object type
//! must be jointly unique across instances. This module stores the
//! definitions and enforces the lifecycle rules; instance-level enforcement
//! happens elsewhere.

mod constraint;
mod lifecycle;
mod store;

pub use constraint::{CreateUniqueRequest, UniqueConstraint, UpdateUniqueRequest};
pub use lifecycle::UniqueLifecycle;
pub use store::UniqueStore;
