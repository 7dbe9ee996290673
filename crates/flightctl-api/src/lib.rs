//! Public API resource types for the flightctl control plane.
//!
//! These are the request/response payloads of the REST API: one resource
//! struct per kind, each carrying an [`ObjectMeta`], an optional typed spec
//! (desired state) and an optional typed status (observed state), plus the
//! matching list type with pagination metadata.
//!
//! The store consumes these types only through conversion functions; it
//! never reaches into spec payloads beyond structural equality.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod authprovider;
pub mod catalog;
pub mod certificatesigningrequest;
pub mod device;
pub mod enrollmentrequest;
pub mod event;
pub mod fleet;
pub mod meta;
pub mod organization;
pub mod repository;
pub mod resourcesync;
pub mod templateversion;

pub use authprovider::{AuthProvider, AuthProviderList, AuthProviderSpec, AuthProviderStatus};
pub use catalog::{Catalog, CatalogList, CatalogSpec, CatalogStatus};
pub use certificatesigningrequest::{
    CertificateSigningRequest, CertificateSigningRequestList, CertificateSigningRequestSpec,
    CertificateSigningRequestStatus,
};
pub use device::{Device, DeviceList, DeviceSpec, DeviceStatus};
pub use enrollmentrequest::{
    EnrollmentRequest, EnrollmentRequestList, EnrollmentRequestSpec, EnrollmentRequestStatus,
};
pub use event::{Event, EventList, ObjectReference};
pub use fleet::{DeviceTemplate, Fleet, FleetList, FleetSpec, FleetStatus};
pub use meta::{ApiStatus, Condition, ListMeta, ObjectMeta};
pub use organization::{Organization, OrganizationList};
pub use repository::{Repository, RepositoryList, RepositorySpec, RepositoryStatus};
pub use resourcesync::{ResourceSync, ResourceSyncList, ResourceSyncSpec, ResourceSyncStatus};
pub use templateversion::{
    TemplateVersion, TemplateVersionList, TemplateVersionSpec, TemplateVersionStatus,
};
