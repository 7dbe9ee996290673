//! Enrollment request store facade.

use uuid::Uuid;

use flightctl_api::{EnrollmentRequest, EnrollmentRequestList};
use flightctl_core::Result;

use crate::db::{db_err, Db};
use crate::generic::{GenericStore, UpdateOptions};
use crate::list::ListParams;
use crate::model::enrollmentrequest::EnrollmentRequestKind;
use crate::model::{self, resource_table_ddl, KindDef};

/// Store for [`EnrollmentRequest`] resources.
pub struct EnrollmentRequestStore {
    db: Db,
    store: GenericStore<EnrollmentRequestKind, EnrollmentRequest, EnrollmentRequestList>,
}

impl EnrollmentRequestStore {
    /// Create the facade over a database handle.
    #[must_use]
    pub fn new(db: Db) -> Self {
        let store = GenericStore::new(
            db.clone(),
            model::enrollmentrequest::from_api,
            model::enrollmentrequest::to_api,
            model::enrollmentrequest::to_list,
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
            conn.execute_batch(&resource_table_ddl(EnrollmentRequestKind::TABLE))
                .map_err(db_err)
        })
    }

    /// Insert a new enrollment request.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` if one with this name exists.
    pub fn create(&self, org_id: Uuid, request: &EnrollmentRequest) -> Result<EnrollmentRequest> {
        self.store.create(org_id, request)
    }

    /// Fetch an enrollment request by name.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent.
    pub fn get(&self, org_id: Uuid, name: &str) -> Result<EnrollmentRequest> {
        self.store.get(org_id, name)
    }

    /// Update an existing enrollment request.
    ///
    /// # Errors
    ///
    /// Propagates optimistic-concurrency and owner-protection errors.
    pub fn update(
        &self,
        org_id: Uuid,
        request: &EnrollmentRequest,
        opts: &UpdateOptions,
    ) -> Result<EnrollmentRequest> {
        self.store.update(org_id, request, opts, None)
    }

    /// Update an enrollment request or create it when absent; returns
    /// whether it was created.
    ///
    /// # Errors
    ///
    /// Propagates optimistic-concurrency and owner-protection errors.
    pub fn create_or_update(
        &self,
        org_id: Uuid,
        request: &EnrollmentRequest,
        opts: &UpdateOptions,
    ) -> Result<(EnrollmentRequest, bool)> {
        self.store.create_or_update(org_id, request, opts, None)
    }

    /// Replace the reported status of an enrollment request.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent.
    pub fn update_status(
        &self,
        org_id: Uuid,
        request: &EnrollmentRequest,
    ) -> Result<EnrollmentRequest> {
        self.store.update_status(org_id, request)
    }

    /// List enrollment requests.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn list(&self, org_id: Uuid, params: &ListParams) -> Result<EnrollmentRequestList> {
        self.store.list(org_id, params)
    }

    /// Delete an enrollment request. Idempotent; returns whether the row
    /// existed.
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails.
    pub fn delete(&self, org_id: Uuid, name: &str) -> Result<bool> {
        self.store.delete(org_id, name, &[])
    }
}
