//! Certificate signing request store facade.

use uuid::Uuid;

use flightctl_api::{CertificateSigningRequest, CertificateSigningRequestList};
use flightctl_core::Result;

use crate::db::{db_err, Db};
use crate::generic::{GenericStore, UpdateOptions};
use crate::list::ListParams;
use crate::model::certificatesigningrequest::CertificateSigningRequestKind;
use crate::model::{self, resource_table_ddl, KindDef};

/// Store for [`CertificateSigningRequest`] resources.
pub struct CertificateSigningRequestStore {
    db: Db,
    store: GenericStore<
        CertificateSigningRequestKind,
        CertificateSigningRequest,
        CertificateSigningRequestList,
    >,
}

impl CertificateSigningRequestStore {
    /// Create the facade over a database handle.
    #[must_use]
    pub fn new(db: Db) -> Self {
        let store = GenericStore::new(
            db.clone(),
            model::certificatesigningrequest::from_api,
            model::certificatesigningrequest::to_api,
            model::certificatesigningrequest::to_list,
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
            conn.execute_batch(&resource_table_ddl(CertificateSigningRequestKind::TABLE))
                .map_err(db_err)
        })
    }

    /// Insert a new certificate signing request.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` if one with this name exists.
    pub fn create(
        &self,
        org_id: Uuid,
        csr: &CertificateSigningRequest,
    ) -> Result<CertificateSigningRequest> {
        self.store.create(org_id, csr)
    }

    /// Fetch a certificate signing request by name.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent.
    pub fn get(&self, org_id: Uuid, name: &str) -> Result<CertificateSigningRequest> {
        self.store.get(org_id, name)
    }

    /// Update an existing certificate signing request.
    ///
    /// # Errors
    ///
    /// Propagates optimistic-concurrency and owner-protection errors.
    pub fn update(
        &self,
        org_id: Uuid,
        csr: &CertificateSigningRequest,
        opts: &UpdateOptions,
    ) -> Result<CertificateSigningRequest> {
        self.store.update(org_id, csr, opts, None)
    }

    /// Update a certificate signing request or create it when absent;
    /// returns whether it was created.
    ///
    /// # Errors
    ///
    /// Propagates optimistic-concurrency and owner-protection errors.
    pub fn create_or_update(
        &self,
        org_id: Uuid,
        csr: &CertificateSigningRequest,
        opts: &UpdateOptions,
    ) -> Result<(CertificateSigningRequest, bool)> {
        self.store.create_or_update(org_id, csr, opts, None)
    }

    /// Replace the reported status of a certificate signing request.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent.
    pub fn update_status(
        &self,
        org_id: Uuid,
        csr: &CertificateSigningRequest,
    ) -> Result<CertificateSigningRequest> {
        self.store.update_status(org_id, csr)
    }

    /// List certificate signing requests.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn list(&self, org_id: Uuid, params: &ListParams) -> Result<CertificateSigningRequestList> {
        self.store.list(org_id, params)
    }

    /// Delete a certificate signing request. Idempotent; returns whether
    /// the row existed.
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails.
    pub fn delete(&self, org_id: Uuid, name: &str) -> Result<bool> {
        self.store.delete(org_id, name, &[])
    }
}
