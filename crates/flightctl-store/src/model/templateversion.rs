//! Template version storage model.

use flightctl_api::{
    ListMeta, TemplateVersion, TemplateVersionList, TemplateVersionSpec, TemplateVersionStatus,
};
use flightctl_core::{Kind, Result};

use super::{meta_to_api, record_from_api, KindDef, Record};

/// Marker for the `template_versions` table.
pub enum TemplateVersionKind {}

impl KindDef for TemplateVersionKind {
    const KIND: Kind = Kind::TemplateVersion;
    const TABLE: &'static str = "template_versions";
    type Spec = TemplateVersionSpec;
    type Status = TemplateVersionStatus;
}

/// A stored template version row.
pub type TemplateVersionRecord = Record<TemplateVersionKind>;

/// Convert an API template version into its storage record.
pub fn from_api(resource: &TemplateVersion) -> Result<TemplateVersionRecord> {
    record_from_api(&resource.metadata, resource.spec.clone(), resource.status.clone())
}

/// Convert a storage record back into an API template version.
pub fn to_api(record: TemplateVersionRecord) -> Result<TemplateVersion> {
    Ok(TemplateVersion {
        metadata: meta_to_api(record.meta),
        spec: record.spec,
        status: record.status,
    })
}

/// Convert a page of records into an API list.
pub fn to_list(
    records: Vec<TemplateVersionRecord>,
    continue_token: Option<String>,
    remaining: Option<i64>,
) -> Result<TemplateVersionList> {
    Ok(TemplateVersionList {
        items: records.into_iter().map(to_api).collect::<Result<_>>()?,
        metadata: ListMeta {
            continue_token,
            remaining_item_count: remaining,
        },
    })
}
