//! Catalog storage model.

use flightctl_api::{Catalog, CatalogList, CatalogSpec, CatalogStatus, ListMeta};
use flightctl_core::{Kind, Result};

use super::{meta_to_api, record_from_api, KindDef, Record};

/// Marker for the `catalogs` table.
pub enum CatalogKind {}

impl KindDef for CatalogKind {
    const KIND: Kind = Kind::Catalog;
    const TABLE: &'static str = "catalogs";
    type Spec = CatalogSpec;
    type Status = CatalogStatus;
}

/// A stored catalog row.
pub type CatalogRecord = Record<CatalogKind>;

/// Convert an API catalog into its storage record.
pub fn from_api(resource: &Catalog) -> Result<CatalogRecord> {
    record_from_api(&resource.metadata, resource.spec.clone(), resource.status.clone())
}

/// Convert a storage record back into an API catalog.
pub fn to_api(record: CatalogRecord) -> Result<Catalog> {
    Ok(Catalog {
        metadata: meta_to_api(record.meta),
        spec: record.spec,
        status: record.status,
    })
}

/// Convert a page of records into an API list.
pub fn to_list(
    records: Vec<CatalogRecord>,
    continue_token: Option<String>,
    remaining: Option<i64>,
) -> Result<CatalogList> {
    Ok(CatalogList {
        items: records.into_iter().map(to_api).collect::<Result<_>>()?,
        metadata: ListMeta {
            continue_token,
            remaining_item_count: remaining,
        },
    })
}
