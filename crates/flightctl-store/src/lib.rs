//! SQLite-backed resource store for the flightctl control plane.
//!
//! The heart of this crate is the [`GenericStore`]: one CRUD engine shared
//! by every resource kind, enforcing generation/resource-version
//! bookkeeping, owner-based write protection, optimistic concurrency with
//! bounded retry, and cursor-based pagination with exact continuation.
//! Per-kind facades instantiate it with their conversion functions and add
//! the handful of operations specific to their kind.
//!
//! # Example
//!
//! ```
//! use flightctl_api::{Device, DeviceSpec, ObjectMeta};
//! use flightctl_store::{Db, Store};
//! use uuid::Uuid;
//!
//! let db = Db::open_in_memory().unwrap();
//! let store = Store::new(&db);
//! store.initial_migration().unwrap();
//!
//! let device = Device {
//!     metadata: ObjectMeta::named("dev-1"),
//!     spec: Some(DeviceSpec::default()),
//!     status: None,
//! };
//! let created = store.devices.create(Uuid::nil(), &device).unwrap();
//! assert_eq!(created.metadata.generation, Some(1));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod authprovider;
pub mod catalog;
pub mod certificatesigningrequest;
pub mod checkpoint;
pub mod db;
pub mod device;
pub mod enrollmentrequest;
pub mod event;
pub mod fleet;
pub mod generic;
pub mod list;
pub mod model;
pub mod organization;
pub mod repository;
pub mod resourcesync;
pub mod templateversion;

pub use authprovider::AuthProviderStore;
pub use catalog::CatalogStore;
pub use certificatesigningrequest::CertificateSigningRequestStore;
pub use checkpoint::CheckpointStore;
pub use db::Db;
pub use device::DeviceStore;
pub use enrollmentrequest::EnrollmentRequestStore;
pub use event::EventStore;
pub use fleet::FleetStore;
pub use generic::{AssociatedDelete, GenericStore, UpdateOptions, ValidationHook};
pub use list::{Continue, ListParams, SortBy, CURRENT_CONTINUE_VERSION};
pub use model::Column;
pub use organization::{OrganizationStore, DEFAULT_ORG_ID};
pub use repository::RepositoryStore;
pub use resourcesync::ResourceSyncStore;
pub use templateversion::TemplateVersionStore;

use uuid::Uuid;

use flightctl_core::Result;

/// All per-kind stores over one database.
pub struct Store {
    /// Device store.
    pub devices: DeviceStore,
    /// Fleet store.
    pub fleets: FleetStore,
    /// Enrollment request store.
    pub enrollment_requests: EnrollmentRequestStore,
    /// Repository store.
    pub repositories: RepositoryStore,
    /// Resource sync store.
    pub resource_syncs: ResourceSyncStore,
    /// Template version store.
    pub template_versions: TemplateVersionStore,
    /// Auth provider store.
    pub auth_providers: AuthProviderStore,
    /// Certificate signing request store.
    pub certificate_signing_requests: CertificateSigningRequestStore,
    /// Catalog store.
    pub catalogs: CatalogStore,
    /// Event store.
    pub events: EventStore,
    /// Organization store.
    pub organizations: OrganizationStore,
    /// Checkpoint store.
    pub checkpoints: CheckpointStore,
}

impl Store {
    /// Wire every facade over the shared database handle.
    #[must_use]
    pub fn new(db: &Db) -> Self {
        Self {
            devices: DeviceStore::new(db.clone()),
            fleets: FleetStore::new(db.clone()),
            enrollment_requests: EnrollmentRequestStore::new(db.clone()),
            repositories: RepositoryStore::new(db.clone()),
            resource_syncs: ResourceSyncStore::new(db.clone()),
            template_versions: TemplateVersionStore::new(db.clone()),
            auth_providers: AuthProviderStore::new(db.clone()),
            certificate_signing_requests: CertificateSigningRequestStore::new(db.clone()),
            catalogs: CatalogStore::new(db.clone()),
            events: EventStore::new(db.clone()),
            organizations: OrganizationStore::new(db.clone()),
            checkpoints: CheckpointStore::new(db.clone()),
        }
    }

    /// Create every table.
    ///
    /// # Errors
    ///
    /// Returns a database error if any migration fails.
    pub fn initial_migration(&self) -> Result<()> {
        self.devices.initial_migration()?;
        self.fleets.initial_migration()?;
        self.enrollment_requests.initial_migration()?;
        self.repositories.initial_migration()?;
        self.resource_syncs.initial_migration()?;
        self.template_versions.initial_migration()?;
        self.auth_providers.initial_migration()?;
        self.certificate_signing_requests.initial_migration()?;
        self.catalogs.initial_migration()?;
        self.events.initial_migration()?;
        self.organizations.initial_migration()?;
        self.checkpoints.initial_migration()?;
        Ok(())
    }

    /// Delete a resource sync, clearing the owner reference on every fleet
    /// it owns inside the same transaction.
    ///
    /// # Errors
    ///
    /// Returns a database error if the transaction fails.
    pub fn delete_resource_sync(&self, org_id: Uuid, name: &str) -> Result<bool> {
        self.resource_syncs.delete(org_id, name, &|tx, owner| {
            FleetStore::unset_owner_tx(tx, org_id, owner)?;
            Ok(())
        })
    }
}
