//! Authorization-gated unique-constraint operations.

use std::sync::Arc;

use tracing::error;

use topodb_core::{CreateUniqueRequest, UniqueConstraint, UpdateUniqueRequest};

use crate::auth::{AuthorizationGateway, UniqueAction};
use crate::config::ServiceConfig;
use crate::database::Database;
use crate::error::Error;

/// Unique-constraint service.
///
/// Every mutation runs the gateway pre-check before the store is touched
/// and mirrors the constraint identity into the permission registry after
/// the mutation committed. A registry-sync failure is surfaced as
/// [`Error::RegistrySync`]; the committed mutation stands.
pub struct UniqueService {
    db: Arc<Database>,
    gateway: Arc<dyn AuthorizationGateway>,
    flush_on_mutation: bool,
}

impl UniqueService {
    /// Create a service over the given database and gateway.
    pub fn new(db: Arc<Database>, gateway: Arc<dyn AuthorizationGateway>) -> Self {
        Self {
            db,
            gateway,
            flush_on_mutation: false,
        }
    }

    /// Create a service honoring the given configuration.
    pub fn with_config(
        db: Arc<Database>,
        gateway: Arc<dyn AuthorizationGateway>,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            db,
            gateway,
            flush_on_mutation: config.flush_on_mutation,
        }
    }

    fn authorize(
        &self,
        action: UniqueAction,
        object_id: &str,
        id: Option<u64>,
    ) -> Result<(), Error> {
        self.gateway.authorize(action, object_id, id).map_err(|reason| {
            error!(
                operation = action.as_str(),
                object_id,
                id,
                reason = %reason,
                "authorization denied"
            );
            Error::PermissionDenied(reason)
        })
    }

    fn flush_if_configured(&self) -> Result<(), Error> {
        if self.flush_on_mutation {
            self.db.flush()?;
        }
        Ok(())
    }

    /// Create a unique constraint and return its assigned id.
    pub fn create_unique(
        &self,
        object_id: &str,
        request: &CreateUniqueRequest,
    ) -> Result<u64, Error> {
        self.authorize(UniqueAction::Create, object_id, None)?;

        let id = self.db.lifecycle().create(object_id, request).map_err(|e| {
            error!(operation = "create", object_id, error = %e, "create unique failed");
            e
        })?;
        self.flush_if_configured()?;

        self.gateway.register_unique(id).map_err(|reason| {
            error!(operation = "create", object_id, id, reason = %reason, "registry sync failed");
            Error::RegistrySync(reason)
        })?;

        Ok(id)
    }

    /// Replace the key set of an existing constraint.
    pub fn update_unique(
        &self,
        object_id: &str,
        id: u64,
        request: &UpdateUniqueRequest,
    ) -> Result<(), Error> {
        self.authorize(UniqueAction::Update, object_id, Some(id))?;

        self.db.lifecycle().update(object_id, id, request).map_err(|e| {
            error!(operation = "update", object_id, id, error = %e, "update unique failed");
            e
        })?;
        self.flush_if_configured()?;

        self.gateway.sync_registered_unique(id).map_err(|reason| {
            error!(operation = "update", object_id, id, reason = %reason, "registry sync failed");
            Error::RegistrySync(reason)
        })?;

        Ok(())
    }

    /// Delete a constraint, subject to the non-emptiness invariant.
    pub fn delete_unique(&self, object_id: &str, id: u64) -> Result<(), Error> {
        self.authorize(UniqueAction::Delete, object_id, Some(id))?;

        self.db.lifecycle().delete(object_id, id).map_err(|e| {
            error!(operation = "delete", object_id, id, error = %e, "delete unique failed");
            e
        })?;
        self.flush_if_configured()?;

        self.gateway.deregister_unique(id).map_err(|reason| {
            error!(operation = "delete", object_id, id, reason = %reason, "registry sync failed");
            Error::RegistrySync(reason)
        })?;

        Ok(())
    }

    /// List the constraints of an object type the caller may see.
    pub fn search_uniques(&self, object_id: &str) -> Result<Vec<UniqueConstraint>, Error> {
        let results = self.db.lifecycle().search(object_id).map_err(|e| {
            error!(operation = "search", object_id, error = %e, "search uniques failed");
            e
        })?;

        self.gateway
            .authorize_search(object_id, &results)
            .map_err(|reason| {
                error!(operation = "search", object_id, reason = %reason, "authorization denied");
                Error::PermissionDenied(reason)
            })?;

        Ok(results)
    }
}
