//! Repository storage model.

use flightctl_api::{ListMeta, Repository, RepositoryList, RepositorySpec, RepositoryStatus};
use flightctl_core::{Kind, Result};

use super::{meta_to_api, record_from_api, KindDef, Record};

/// Marker for the `repositories` table.
pub enum RepositoryKind {}

impl KindDef for RepositoryKind {
    const KIND: Kind = Kind::Repository;
    const TABLE: &'static str = "repositories";
    type Spec = RepositorySpec;
    type Status = RepositoryStatus;
}

/// A stored repository row.
pub type RepositoryRecord = Record<RepositoryKind>;

/// Convert an API repository into its storage record.
pub fn from_api(resource: &Repository) -> Result<RepositoryRecord> {
    record_from_api(&resource.metadata, resource.spec.clone(), resource.status.clone())
}

/// Convert a storage record back into an API repository.
pub fn to_api(record: RepositoryRecord) -> Result<Repository> {
    Ok(Repository {
        metadata: meta_to_api(record.meta),
        spec: record.spec,
        status: record.status,
    })
}

/// Convert a page of records into an API list.
pub fn to_list(
    records: Vec<RepositoryRecord>,
    continue_token: Option<String>,
    remaining: Option<i64>,
) -> Result<RepositoryList> {
    Ok(RepositoryList {
        items: records.into_iter().map(to_api).collect::<Result<_>>()?,
        metadata: ListMeta {
            continue_token,
            remaining_item_count: remaining,
        },
    })
}
