//! Certificate signing request storage model.

use flightctl_api::{
    CertificateSigningRequest, CertificateSigningRequestList, CertificateSigningRequestSpec,
    CertificateSigningRequestStatus, ListMeta,
};
use flightctl_core::{Kind, Result};

use super::{meta_to_api, record_from_api, KindDef, Record};

/// Marker for the `certificate_signing_requests` table.
pub enum CertificateSigningRequestKind {}

impl KindDef for CertificateSigningRequestKind {
    const KIND: Kind = Kind::CertificateSigningRequest;
    const TABLE: &'static str = "certificate_signing_requests";
    type Spec = CertificateSigningRequestSpec;
    type Status = CertificateSigningRequestStatus;
}

/// A stored certificate signing request row.
pub type CertificateSigningRequestRecord = Record<CertificateSigningRequestKind>;

/// Convert an API certificate signing request into its storage record.
pub fn from_api(resource: &CertificateSigningRequest) -> Result<CertificateSigningRequestRecord> {
    record_from_api(&resource.metadata, resource.spec.clone(), resource.status.clone())
}

/// Convert a storage record back into an API certificate signing request.
pub fn to_api(record: CertificateSigningRequestRecord) -> Result<CertificateSigningRequest> {
    Ok(CertificateSigningRequest {
        metadata: meta_to_api(record.meta),
        spec: record.spec,
        status: record.status,
    })
}

/// Convert a page of records into an API list.
pub fn to_list(
    records: Vec<CertificateSigningRequestRecord>,
    continue_token: Option<String>,
    remaining: Option<i64>,
) -> Result<CertificateSigningRequestList> {
    Ok(CertificateSigningRequestList {
        items: records.into_iter().map(to_api).collect::<Result<_>>()?,
        metadata: ListMeta {
            continue_token,
            remaining_item_count: remaining,
        },
    })
}
