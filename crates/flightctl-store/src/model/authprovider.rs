//! Auth provider storage model.

use flightctl_api::{AuthProvider, AuthProviderList, AuthProviderSpec, AuthProviderStatus, ListMeta};
use flightctl_core::{Kind, Result};

use super::{meta_to_api, record_from_api, KindDef, Record};

/// Marker for the `auth_providers` table.
pub enum AuthProviderKind {}

impl KindDef for AuthProviderKind {
    const KIND: Kind = Kind::AuthProvider;
    const TABLE: &'static str = "auth_providers";
    type Spec = AuthProviderSpec;
    type Status = AuthProviderStatus;
}

/// A stored auth provider row.
pub type AuthProviderRecord = Record<AuthProviderKind>;

/// Convert an API auth provider into its storage record.
pub fn from_api(resource: &AuthProvider) -> Result<AuthProviderRecord> {
    record_from_api(&resource.metadata, resource.spec.clone(), resource.status.clone())
}

/// Convert a storage record back into an API auth provider.
pub fn to_api(record: AuthProviderRecord) -> Result<AuthProvider> {
    Ok(AuthProvider {
        metadata: meta_to_api(record.meta),
        spec: record.spec,
        status: record.status,
    })
}

/// Convert a page of records into an API list.
pub fn to_list(
    records: Vec<AuthProviderRecord>,
    continue_token: Option<String>,
    remaining: Option<i64>,
) -> Result<AuthProviderList> {
    Ok(AuthProviderList {
        items: records.into_iter().map(to_api).collect::<Result<_>>()?,
        metadata: ListMeta {
            continue_token,
            remaining_item_count: remaining,
        },
    })
}
