//! Fleet store facade.
//!
//! Fleets are the one kind whose labels are owner-protected alongside the
//! spec, and they are the target of the resource-sync ownership transfer:
//! when a sync is deleted, its fleets have their owner reference cleared
//! inside the same transaction.

use rusqlite::{params, Transaction};
use uuid::Uuid;

use flightctl_api::{Fleet, FleetList};
use flightctl_core::{Kind, Result};

use crate::db::{db_err, Db};
use crate::generic::{GenericStore, UpdateOptions, ValidationHook};
use crate::list::ListParams;
use crate::model::device::DeviceKind;
use crate::model::fleet::FleetKind;
use crate::model::{self, resource_table_ddl, KindDef};

/// Store for [`Fleet`] resources.
pub struct FleetStore {
    db: Db,
    store: GenericStore<FleetKind, Fleet, FleetList>,
}

impl FleetStore {
    /// Create the facade over a database handle.
    #[must_use]
    pub fn new(db: Db) -> Self {
        let store = GenericStore::new(
            db.clone(),
            model::fleet::from_api,
            model::fleet::to_api,
            model::fleet::to_list,
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
            conn.execute_batch(&resource_table_ddl(FleetKind::TABLE))
                .map_err(db_err)
        })
    }

    /// Insert a new fleet.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` if a fleet with this name exists.
    pub fn create(&self, org_id: Uuid, fleet: &Fleet) -> Result<Fleet> {
        self.store.create(org_id, fleet)
    }

    /// Fetch a fleet by name.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent.
    pub fn get(&self, org_id: Uuid, name: &str) -> Result<Fleet> {
        self.store.get(org_id, name)
    }

    /// Update an existing fleet, running the optional validation hook
    /// against the stored resource first.
    ///
    /// # Errors
    ///
    /// Propagates validation, optimistic-concurrency and owner-protection
    /// errors.
    pub fn update(
        &self,
        org_id: Uuid,
        fleet: &Fleet,
        opts: &UpdateOptions,
        validation: Option<ValidationHook<'_, Fleet>>,
    ) -> Result<Fleet> {
        self.store.update(org_id, fleet, opts, validation)
    }

    /// Update a fleet or create it when absent; returns whether it was
    /// created.
    ///
    /// # Errors
    ///
    /// Propagates validation, optimistic-concurrency and owner-protection
    /// errors.
    pub fn create_or_update(
        &self,
        org_id: Uuid,
        fleet: &Fleet,
        opts: &UpdateOptions,
        validation: Option<ValidationHook<'_, Fleet>>,
    ) -> Result<(Fleet, bool)> {
        self.store.create_or_update(org_id, fleet, opts, validation)
    }

    /// Replace the reported status of a fleet.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent.
    pub fn update_status(&self, org_id: Uuid, fleet: &Fleet) -> Result<Fleet> {
        self.store.update_status(org_id, fleet)
    }

    /// List fleets.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn list(&self, org_id: Uuid, params: &ListParams) -> Result<FleetList> {
        self.store.list(org_id, params)
    }

    /// Delete a fleet. Idempotent; returns whether the row existed.
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails.
    pub fn delete(&self, org_id: Uuid, name: &str) -> Result<bool> {
        self.store.delete(org_id, name, &[])
    }

    /// Number of devices currently owned by the named fleet.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn device_count(&self, org_id: Uuid, name: &str) -> Result<i64> {
        let owner = Kind::Fleet.owner_ref(name);
        self.db.with(|conn| {
            conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM {} WHERE org_id = ?1 AND owner = ?2 AND spec IS NOT NULL",
                    DeviceKind::TABLE
                ),
                params![org_id.to_string(), owner],
                |row| row.get(0),
            )
            .map_err(db_err)
        })
    }

    /// Clear the owner reference on every fleet owned by `owner`, inside a
    /// caller-managed transaction. Each released fleet's resource version
    /// advances.
    ///
    /// # Errors
    ///
    /// Returns a database error if the update fails.
    pub fn unset_owner_tx(tx: &Transaction<'_>, org_id: Uuid, owner: &str) -> Result<usize> {
        tx.execute(
            &format!(
                "UPDATE {} SET owner = NULL, \
                 resource_version = COALESCE(resource_version, 0) + 1 \
                 WHERE org_id = ?1 AND owner = ?2",
                FleetKind::TABLE
            ),
            params![org_id.to_string(), owner],
        )
        .map_err(db_err)
    }

    /// Clear the owner reference on every fleet owned by any resource of
    /// the given kind, inside a caller-managed transaction.
    ///
    /// # Errors
    ///
    /// Returns a database error if the update fails.
    pub fn unset_owner_by_kind_tx(tx: &Transaction<'_>, org_id: Uuid, kind: Kind) -> Result<usize> {
        tx.execute(
            &format!(
                "UPDATE {} SET owner = NULL, \
                 resource_version = COALESCE(resource_version, 0) + 1 \
                 WHERE org_id = ?1 AND owner LIKE ?2",
                FleetKind::TABLE
            ),
            params![org_id.to_string(), format!("{}/%", kind.as_str())],
        )
        .map_err(db_err)
    }
}
