//! Resource sync store facade.
//!
//! Deleting a sync must not strand the resources it owns behind owner
//! protection, so the delete first transfers ownership away (clearing the
//! owner reference on everything the sync owns) and then removes the row,
//! all inside one transaction.

use rusqlite::{params, Transaction};
use uuid::Uuid;

use flightctl_api::{ResourceSync, ResourceSyncList};
use flightctl_core::{Kind, Result};

use crate::db::{db_err, Db};
use crate::generic::{GenericStore, UpdateOptions};
use crate::list::ListParams;
use crate::model::resourcesync::ResourceSyncKind;
use crate::model::{self, resource_table_ddl, KindDef};

/// Callback releasing resources owned by the sync being deleted; runs
/// inside the delete transaction and receives the sync's owner reference.
pub type ReleaseOwnedFn<'a> = &'a dyn Fn(&Transaction<'_>, &str) -> Result<()>;

/// Store for [`ResourceSync`] resources.
pub struct ResourceSyncStore {
    db: Db,
    store: GenericStore<ResourceSyncKind, ResourceSync, ResourceSyncList>,
}

impl ResourceSyncStore {
    /// Create the facade over a database handle.
    #[must_use]
    pub fn new(db: Db) -> Self {
        let store = GenericStore::new(
            db.clone(),
            model::resourcesync::from_api,
            model::resourcesync::to_api,
            model::resourcesync::to_list,
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
            conn.execute_batch(&resource_table_ddl(ResourceSyncKind::TABLE))
                .map_err(db_err)
        })
    }

    /// Insert a new resource sync.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` if one with this name exists.
    pub fn create(&self, org_id: Uuid, sync: &ResourceSync) -> Result<ResourceSync> {
        self.store.create(org_id, sync)
    }

    /// Fetch a resource sync by name.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent.
    pub fn get(&self, org_id: Uuid, name: &str) -> Result<ResourceSync> {
        self.store.get(org_id, name)
    }

    /// Update an existing resource sync.
    ///
    /// # Errors
    ///
    /// Propagates optimistic-concurrency and owner-protection errors.
    pub fn update(
        &self,
        org_id: Uuid,
        sync: &ResourceSync,
        opts: &UpdateOptions,
    ) -> Result<ResourceSync> {
        self.store.update(org_id, sync, opts, None)
    }

    /// Update a resource sync or create it when absent; returns whether it
    /// was created.
    ///
    /// # Errors
    ///
    /// Propagates optimistic-concurrency and owner-protection errors.
    pub fn create_or_update(
        &self,
        org_id: Uuid,
        sync: &ResourceSync,
        opts: &UpdateOptions,
    ) -> Result<(ResourceSync, bool)> {
        self.store.create_or_update(org_id, sync, opts, None)
    }

    /// Replace the reported status of a resource sync.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent.
    pub fn update_status(&self, org_id: Uuid, sync: &ResourceSync) -> Result<ResourceSync> {
        self.store.update_status(org_id, sync)
    }

    /// List resource syncs.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn list(&self, org_id: Uuid, params: &ListParams) -> Result<ResourceSyncList> {
        self.store.list(org_id, params)
    }

    /// Delete a resource sync, releasing everything it owns first. The
    /// release callback and the row delete commit or roll back together.
    /// Idempotent; returns whether the sync row existed.
    ///
    /// # Errors
    ///
    /// Returns a database error if the transaction fails; a failing release
    /// callback aborts the delete.
    pub fn delete(&self, org_id: Uuid, name: &str, release_owned: ReleaseOwnedFn<'_>) -> Result<bool> {
        let owner = Kind::ResourceSync.owner_ref(name);
        self.db.transaction(|tx| {
            release_owned(tx, &owner)?;
            let affected = tx
                .execute(
                    &format!(
                        "DELETE FROM {} WHERE org_id = ?1 AND name = ?2 AND spec IS NOT NULL",
                        ResourceSyncKind::TABLE
                    ),
                    params![org_id.to_string(), name],
                )
                .map_err(db_err)?;
            Ok(affected > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use flightctl_api::{DeviceTemplate, Fleet, FleetSpec, ObjectMeta, ResourceSyncSpec};

    use super::*;
    use crate::fleet::FleetStore;

    fn stores() -> (ResourceSyncStore, FleetStore) {
        let db = Db::open_in_memory().unwrap();
        let syncs = ResourceSyncStore::new(db.clone());
        let fleets = FleetStore::new(db);
        syncs.initial_migration().unwrap();
        fleets.initial_migration().unwrap();
        (syncs, fleets)
    }

    #[test]
    fn delete_transfers_ownership_before_removal() {
        let (syncs, fleets) = stores();
        let org = Uuid::nil();

        syncs
            .create(
                org,
                &ResourceSync {
                    metadata: ObjectMeta::named("sync-1"),
                    spec: Some(ResourceSyncSpec {
                        repository: "config".to_string(),
                        path: "fleets/".to_string(),
                        target_revision: None,
                    }),
                    status: None,
                },
            )
            .unwrap();

        let mut owned = Fleet {
            metadata: ObjectMeta::named("edge"),
            spec: Some(FleetSpec {
                selector: None,
                template: DeviceTemplate::default(),
            }),
            status: None,
        };
        owned.metadata.owner = Some(Kind::ResourceSync.owner_ref("sync-1"));
        fleets.create(org, &owned).unwrap();

        let deleted = syncs
            .delete(org, "sync-1", &|tx, owner| {
                FleetStore::unset_owner_tx(tx, org, owner)?;
                Ok(())
            })
            .unwrap();
        assert!(deleted);

        assert!(syncs.get(org, "sync-1").is_err());
        assert_eq!(fleets.get(org, "edge").unwrap().metadata.owner, None);
    }
}
