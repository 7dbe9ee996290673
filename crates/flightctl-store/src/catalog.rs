//! Catalog store facade.

use uuid::Uuid;

use flightctl_api::{Catalog, CatalogList};
use flightctl_core::Result;

use crate::db::{db_err, Db};
use crate::generic::{GenericStore, UpdateOptions};
use crate::list::ListParams;
use crate::model::catalog::CatalogKind;
use crate::model::{self, resource_table_ddl, KindDef};

/// Store for [`Catalog`] resources.
pub struct CatalogStore {
    db: Db,
    store: GenericStore<CatalogKind, Catalog, CatalogList>,
}

impl CatalogStore {
    /// Create the facade over a database handle.
    #[must_use]
    pub fn new(db: Db) -> Self {
        let store = GenericStore::new(
            db.clone(),
            model::catalog::from_api,
            model::catalog::to_api,
            model::catalog::to_list,
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
            conn.execute_batch(&resource_table_ddl(CatalogKind::TABLE))
                .map_err(db_err)
        })
    }

    /// Insert a new catalog.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` if one with this name exists.
    pub fn create(&self, org_id: Uuid, catalog: &Catalog) -> Result<Catalog> {
        self.store.create(org_id, catalog)
    }

    /// Fetch a catalog by name.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent.
    pub fn get(&self, org_id: Uuid, name: &str) -> Result<Catalog> {
        self.store.get(org_id, name)
    }

    /// Update an existing catalog.
    ///
    /// # Errors
    ///
    /// Propagates optimistic-concurrency and owner-protection errors.
    pub fn update(&self, org_id: Uuid, catalog: &Catalog, opts: &UpdateOptions) -> Result<Catalog> {
        self.store.update(org_id, catalog, opts, None)
    }

    /// Update a catalog or create it when absent; returns whether it was
    /// created.
    ///
    /// # Errors
    ///
    /// Propagates optimistic-concurrency and owner-protection errors.
    pub fn create_or_update(
        &self,
        org_id: Uuid,
        catalog: &Catalog,
        opts: &UpdateOptions,
    ) -> Result<(Catalog, bool)> {
        self.store.create_or_update(org_id, catalog, opts, None)
    }

    /// Replace the reported status of a catalog.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent.
    pub fn update_status(&self, org_id: Uuid, catalog: &Catalog) -> Result<Catalog> {
        self.store.update_status(org_id, catalog)
    }

    /// List catalogs.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn list(&self, org_id: Uuid, params: &ListParams) -> Result<CatalogList> {
        self.store.list(org_id, params)
    }

    /// Delete a catalog. Idempotent; returns whether the row existed.
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails.
    pub fn delete(&self, org_id: Uuid, name: &str) -> Result<bool> {
        self.store.delete(org_id, name, &[])
    }
}
