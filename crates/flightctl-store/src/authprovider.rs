//! Auth provider store facade.

use uuid::Uuid;

use flightctl_api::{AuthProvider, AuthProviderList};
use flightctl_core::Result;

use crate::db::{db_err, Db};
use crate::generic::{GenericStore, UpdateOptions};
use crate::list::ListParams;
use crate::model::authprovider::AuthProviderKind;
use crate::model::{self, resource_table_ddl, KindDef};

/// Store for [`AuthProvider`] resources.
pub struct AuthProviderStore {
    db: Db,
    store: GenericStore<AuthProviderKind, AuthProvider, AuthProviderList>,
}

impl AuthProviderStore {
    /// Create the facade over a database handle.
    #[must_use]
    pub fn new(db: Db) -> Self {
        let store = GenericStore::new(
            db.clone(),
            model::authprovider::from_api,
            model::authprovider::to_api,
            model::authprovider::to_list,
        );
        Self { db, store }
    }

    /// Create the backing table.
    ///
    /// # Errors
    ///
    /// Returns a database error if the DDL fails.
    pub fn initial_migration(&self) -> Result<()> {
        self.db.with(|conn| {
            conn.execute_batch(&resource_table_ddl(AuthProviderKind::TABLE))
                .map_err(db_err)
        })
    }

    /// Insert a new auth provider.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` if one with this name exists.
    pub fn create(&self, org_id: Uuid, provider: &AuthProvider) -> Result<AuthProvider> {
        self.store.create(org_id, provider)
    }

    /// Fetch an auth provider by name.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent.
    pub fn get(&self, org_id: Uuid, name: &str) -> Result<AuthProvider> {
        self.store.get(org_id, name)
    }

    /// Update an existing auth provider.
    ///
    /// # Errors
    ///
    /// Propagates optimistic-concurrency and owner-protection errors.
    pub fn update(
        &self,
        org_id: Uuid,
        provider: &AuthProvider,
        opts: &UpdateOptions,
    ) -> Result<AuthProvider> {
        self.store.update(org_id, provider, opts, None)
    }

    /// Update an auth provider or create it when absent; returns whether it
    /// was created.
    ///
    /// # Errors
    ///
    /// Propagates optimistic-concurrency and owner-protection errors.
    pub fn create_or_update(
        &self,
        org_id: Uuid,
        provider: &AuthProvider,
        opts: &UpdateOptions,
    ) -> Result<(AuthProvider, bool)> {
        self.store.create_or_update(org_id, provider, opts, None)
    }

    /// Replace the reported status of an auth provider.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent.
    pub fn update_status(&self, org_id: Uuid, provider: &AuthProvider) -> Result<AuthProvider> {
        self.store.update_status(org_id, provider)
    }

    /// List auth providers.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn list(&self, org_id: Uuid, params: &ListParams) -> Result<AuthProviderList> {
        self.store.list(org_id, params)
    }

    /// Delete an auth provider. Idempotent; returns whether the row
    /// existed.
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails.
    pub fn delete(&self, org_id: Uuid, name: &str) -> Result<bool> {
        self.store.delete(org_id, name, &[])
    }
}
