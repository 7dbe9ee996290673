//! Device store facade.

use uuid::Uuid;

use flightctl_api::{Device, DeviceList};
use flightctl_core::Result;

use crate::db::{db_err, Db};
use crate::generic::{AssociatedDelete, GenericStore, UpdateOptions};
use crate::list::ListParams;
use crate::model::device::DeviceKind;
use crate::model::enrollmentrequest::EnrollmentRequestKind;
use crate::model::{self, resource_table_ddl, KindDef};

/// Store for [`Device`] resources.
pub struct DeviceStore {
    db: Db,
    store: GenericStore<DeviceKind, Device, DeviceList>,
}

impl DeviceStore {
    /// Create the facade over a database handle.
    #[must_use]
    pub fn new(db: Db) -> Self {
        let store = GenericStore::new(
            db.clone(),
            model::device::from_api,
            model::device::to_api,
            model::device::to_list,
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
            conn.execute_batch(&resource_table_ddl(DeviceKind::TABLE))
                .map_err(db_err)
        })
    }

    /// Insert a new device.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` if a device with this name exists.
    pub fn create(&self, org_id: Uuid, device: &Device) -> Result<Device> {
        self.store.create(org_id, device)
    }

    /// Fetch a device by name.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent.
    pub fn get(&self, org_id: Uuid, name: &str) -> Result<Device> {
        self.store.get(org_id, name)
    }

    /// Update an existing device.
    ///
    /// # Errors
    ///
    /// Propagates optimistic-concurrency and owner-protection errors.
    pub fn update(&self, org_id: Uuid, device: &Device, opts: &UpdateOptions) -> Result<Device> {
        self.store.update(org_id, device, opts, None)
    }

    /// Update a device or create it when absent; returns whether it was
    /// created.
    ///
    /// # Errors
    ///
    /// Propagates optimistic-concurrency and owner-protection errors.
    pub fn create_or_update(
        &self,
        org_id: Uuid,
        device: &Device,
        opts: &UpdateOptions,
    ) -> Result<(Device, bool)> {
        self.store.create_or_update(org_id, device, opts, None)
    }

    /// Replace the reported status of a device.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent.
    pub fn update_status(&self, org_id: Uuid, device: &Device) -> Result<Device> {
        self.store.update_status(org_id, device)
    }

    /// List devices.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn list(&self, org_id: Uuid, params: &ListParams) -> Result<DeviceList> {
        self.store.list(org_id, params)
    }

    /// Count devices matching the given filters.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn count(&self, org_id: Uuid, params: &ListParams) -> Result<i64> {
        self.store.count(org_id, params)
    }

    /// Delete a device together with its enrollment request. Idempotent;
    /// returns whether the device row existed.
    ///
    /// # Errors
    ///
    /// Returns a database error if the transaction fails.
    pub fn delete(&self, org_id: Uuid, name: &str) -> Result<bool> {
        let deleted = self.store.delete(
            org_id,
            name,
            &[AssociatedDelete {
                table: EnrollmentRequestKind::TABLE,
                org_id,
                name: name.to_string(),
            }],
        )?;
        if deleted {
            tracing::debug!(name, "deleted device and its enrollment request");
        }
        Ok(deleted)
    }
}
