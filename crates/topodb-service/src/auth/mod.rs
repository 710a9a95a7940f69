//! Authorization gateway for unique-constraint operations.
//!
//! Mutations follow a two-phase contract: a permission check before the
//! store is touched, and a registry sync after the mutation committed. Both
//! phases live behind a trait so the service is testable without a live
//! policy backend.

use topodb_core::UniqueConstraint;

/// The operation a caller wants to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueAction {
    /// Create a new constraint on an object type.
    Create,
    /// Replace the key set of an existing constraint.
    Update,
    /// Delete an existing constraint.
    Delete,
}

impl UniqueAction {
    /// Action name for log fields and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            UniqueAction::Create => "create",
            UniqueAction::Update => "update",
            UniqueAction::Delete => "delete",
        }
    }
}

/// Pluggable authorization backend.
///
/// `authorize` gates a mutation before any store access; the `register` /
/// `sync` / `deregister` calls mirror constraint identity into the external
/// permission registry after the mutation committed. A sync failure must be
/// reported to the caller, but the committed mutation is not rolled back;
/// compensation is the caller's concern.
pub trait AuthorizationGateway: Send + Sync {
    /// Check whether a mutation may proceed.
    ///
    /// `id` is `None` for create, where the constraint does not exist yet.
    fn authorize(&self, action: UniqueAction, object_id: &str, id: Option<u64>)
        -> Result<(), String>;

    /// Check whether the caller may see the given search results.
    fn authorize_search(&self, object_id: &str, results: &[UniqueConstraint])
        -> Result<(), String>;

    /// Mirror a newly created constraint into the permission registry.
    fn register_unique(&self, id: u64) -> Result<(), String>;

    /// Refresh a constraint's registry entry after an update.
    fn sync_registered_unique(&self, id: u64) -> Result<(), String>;

    /// Remove a constraint's registry entry after deletion.
    fn deregister_unique(&self, id: u64) -> Result<(), String>;
}

/// Gateway that permits everything and syncs nowhere.
///
/// Used by local admin tooling and tests; production deployments implement
/// [`AuthorizationGateway`] against their policy service.
#[derive(Debug, Clone, Default)]
pub struct AllowAllGateway;

impl AuthorizationGateway for AllowAllGateway {
    fn authorize(&self, _: UniqueAction, _: &str, _: Option<u64>) -> Result<(), String> {
        Ok(())
    }

    fn authorize_search(&self, _: &str, _: &[UniqueConstraint]) -> Result<(), String> {
        Ok(())
    }

    fn register_unique(&self, _: u64) -> Result<(), String> {
        Ok(())
    }

    fn sync_registered_unique(&self, _: u64) -> Result<(), String> {
        Ok(())
    }

    fn deregister_unique(&self, _: u64) -> Result<(), String> {
        Ok(())
    }
}
