//! Storage models.
//!
//! Every org-scoped resource kind persists to a table with the same column
//! set. The shared columns live in [`RecordMeta`]; the typed spec and status
//! payloads are pinned per kind by a [`KindDef`] marker. [`Record`] combines
//! the two and implements the capability contract the generic store
//! operates through: metadata accessors, nil-spec detection, structural
//! spec comparison, and the non-nil field set for selective column updates.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use flightctl_api::ObjectMeta;
use flightctl_core::{Kind, Result, StoreError};

pub mod authprovider;
pub mod catalog;
pub mod certificatesigningrequest;
pub mod device;
pub mod enrollmentrequest;
pub mod fleet;
pub mod repository;
pub mod resourcesync;
pub mod templateversion;

/// The shared column list, in the order [`Record::from_row`] expects.
pub(crate) const SELECT_COLUMNS: &str =
    "org_id, name, owner, generation, resource_version, labels, annotations, spec, status, created_at";

/// Columns the generic store can include in a selective update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// The desired-state JSON payload.
    Spec,
    /// The owner reference.
    Owner,
    /// The spec-change counter.
    Generation,
    /// The optimistic-concurrency token.
    ResourceVersion,
    /// The labels map.
    Labels,
    /// The annotations map.
    Annotations,
}

impl Column {
    /// The SQL column name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Spec => "spec",
            Self::Owner => "owner",
            Self::Generation => "generation",
            Self::ResourceVersion => "resource_version",
            Self::Labels => "labels",
            Self::Annotations => "annotations",
        }
    }
}

/// Pins the table, kind and typed payloads for one resource kind.
pub trait KindDef: Send + Sync + 'static {
    /// The resource kind.
    const KIND: Kind;
    /// The backing table name.
    const TABLE: &'static str;
    /// Typed desired-state payload.
    type Spec: Serialize + DeserializeOwned + PartialEq + Clone + Send + Sync + 'static;
    /// Typed observed-state payload.
    type Status: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;
}

/// The columns shared by every resource table.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMeta {
    /// Owning organization.
    pub org_id: Uuid,
    /// Resource name, unique within org and kind.
    pub name: String,
    /// Owner reference when managed by another resource.
    pub owner: Option<String>,
    /// Incremented only on spec changes.
    pub generation: Option<i64>,
    /// Incremented on every successful write.
    pub resource_version: Option<i64>,
    /// Labels map, stored as JSON text.
    pub labels: Option<BTreeMap<String, String>>,
    /// Annotations map, stored as JSON text.
    pub annotations: Option<BTreeMap<String, String>>,
    /// Creation time; never touched by updates.
    pub created_at: DateTime<Utc>,
}

/// A stored resource row with typed payloads.
pub struct Record<K: KindDef> {
    /// The shared columns.
    pub meta: RecordMeta,
    /// Desired state; `None` marks a placeholder row.
    pub spec: Option<K::Spec>,
    /// Observed state.
    pub status: Option<K::Status>,
}

impl<K: KindDef> Clone for Record<K> {
    fn clone(&self) -> Self {
        Self {
            meta: self.meta.clone(),
            spec: self.spec.clone(),
            status: self.status.clone(),
        }
    }
}

impl<K: KindDef> Record<K> {
    /// Whether this row is a placeholder with no desired state.
    #[must_use]
    pub fn has_nil_spec(&self) -> bool {
        self.spec.is_none()
    }

    /// Structural spec comparison; metadata is not considered.
    #[must_use]
    pub fn has_same_spec_as(&self, other: &Self) -> bool {
        self.spec == other.spec
    }

    /// The metadata columns that were actually supplied on this record, in
    /// the order they will be written.
    #[must_use]
    pub fn non_nil_fields(&self) -> Vec<Column> {
        let mut fields = Vec::new();
        if self.meta.generation.is_some() {
            fields.push(Column::Generation);
        }
        if self.meta.labels.is_some() {
            fields.push(Column::Labels);
        }
        if self.meta.owner.is_some() {
            fields.push(Column::Owner);
        }
        if self.meta.annotations.is_some() {
            fields.push(Column::Annotations);
        }
        if self.meta.resource_version.is_some() {
            fields.push(Column::ResourceVersion);
        }
        fields
    }

    /// The spec payload as JSON text, `None` for placeholders.
    pub(crate) fn spec_json(&self) -> Result<Option<String>> {
        to_json(self.spec.as_ref())
    }

    /// The status payload as JSON text.
    pub(crate) fn status_json(&self) -> Result<Option<String>> {
        to_json(self.status.as_ref())
    }

    /// The SQL value for one updatable column.
    pub(crate) fn column_value(&self, column: Column) -> Result<rusqlite::types::Value> {
        Ok(match column {
            Column::Spec => opt_text(self.spec_json()?),
            Column::Owner => opt_text(self.meta.owner.clone()),
            Column::Generation => opt_int(self.meta.generation),
            Column::ResourceVersion => opt_int(self.meta.resource_version),
            Column::Labels => opt_text(to_json(self.meta.labels.as_ref())?),
            Column::Annotations => opt_text(to_json(self.meta.annotations.as_ref())?),
        })
    }

    /// Decode a row fetched with [`SELECT_COLUMNS`].
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let org_id: String = row.get(0)?;
        let org_id = Uuid::parse_str(&org_id).map_err(|e| conv_err(0, e))?;
        let created_at: String = row.get(9)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| conv_err(9, e))?
            .with_timezone(&Utc);

        Ok(Self {
            meta: RecordMeta {
                org_id,
                name: row.get(1)?,
                owner: row.get(2)?,
                generation: row.get(3)?,
                resource_version: row.get(4)?,
                labels: from_json_column(row, 5)?,
                annotations: from_json_column(row, 6)?,
                created_at,
            },
            spec: from_json_column(row, 7)?,
            status: from_json_column(row, 8)?,
        })
    }
}

/// DDL for one resource table sharing the common column set.
pub(crate) fn resource_table_ddl(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n\
         \torg_id TEXT NOT NULL,\n\
         \tname TEXT NOT NULL,\n\
         \towner TEXT,\n\
         \tgeneration INTEGER,\n\
         \tresource_version INTEGER,\n\
         \tlabels TEXT,\n\
         \tannotations TEXT,\n\
         \tspec TEXT,\n\
         \tstatus TEXT,\n\
         \tcreated_at TEXT NOT NULL,\n\
         \tPRIMARY KEY (org_id, name)\n\
         );\n\
         CREATE INDEX IF NOT EXISTS idx_{table}_owner ON {table} (owner);"
    )
}

/// Convert API metadata into storage metadata.
///
/// The wire resource version is an opaque decimal string; anything else is
/// rejected before reaching the database.
pub(crate) fn record_from_api<K: KindDef>(
    meta: &ObjectMeta,
    spec: Option<K::Spec>,
    status: Option<K::Status>,
) -> Result<Record<K>> {
    let name = meta.name.clone().ok_or(StoreError::ResourceNameIsNil)?;
    let resource_version = meta
        .resource_version
        .as_deref()
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| StoreError::IllegalResourceVersionFormat)
        })
        .transpose()?;

    Ok(Record {
        meta: RecordMeta {
            org_id: Uuid::nil(),
            name,
            owner: meta.owner.clone(),
            generation: meta.generation,
            resource_version,
            labels: meta.labels.clone(),
            annotations: meta.annotations.clone(),
            created_at: meta.creation_timestamp.unwrap_or_else(Utc::now),
        },
        spec,
        status,
    })
}

/// Convert storage metadata back into API metadata.
pub(crate) fn meta_to_api(meta: RecordMeta) -> ObjectMeta {
    ObjectMeta {
        name: Some(meta.name),
        owner: meta.owner,
        generation: meta.generation,
        resource_version: meta.resource_version.map(|v| v.to_string()),
        labels: meta.labels,
        annotations: meta.annotations,
        creation_timestamp: Some(meta.created_at),
    }
}

/// Timestamps are stored as RFC 3339 with nanosecond precision in UTC, so
/// their lexicographic order matches their chronological order.
pub(crate) fn fmt_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn to_json<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
    value
        .map(|v| serde_json::to_string(v).map_err(|e| StoreError::Serialization(e.to_string())))
        .transpose()
}

fn from_json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|s| serde_json::from_str(&s).map_err(|e| conv_err(idx, e)))
        .transpose()
}

fn conv_err(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn opt_text(value: Option<String>) -> rusqlite::types::Value {
    value.map_or(rusqlite::types::Value::Null, rusqlite::types::Value::Text)
}

fn opt_int(value: Option<i64>) -> rusqlite::types::Value {
    value.map_or(rusqlite::types::Value::Null, rusqlite::types::Value::Integer)
}

#[cfg(test)]
mod tests {
    use super::device::DeviceKind;
    use super::*;
    use flightctl_api::DeviceSpec;

    fn record(spec: Option<DeviceSpec>) -> Record<DeviceKind> {
        Record {
            meta: RecordMeta {
                org_id: Uuid::nil(),
                name: "dev".to_string(),
                owner: None,
                generation: None,
                resource_version: None,
                labels: None,
                annotations: None,
                created_at: Utc::now(),
            },
            spec,
            status: None,
        }
    }

    #[test]
    fn nil_spec_detection() {
        assert!(record(None).has_nil_spec());
        assert!(!record(Some(DeviceSpec::default())).has_nil_spec());
    }

    #[test]
    fn spec_comparison_is_structural() {
        let a = record(Some(DeviceSpec {
            os_image: Some("quay.io/os:1".to_string()),
            config: None,
        }));
        let mut b = a.clone();
        assert!(a.has_same_spec_as(&b));

        b.spec = Some(DeviceSpec {
            os_image: Some("quay.io/os:2".to_string()),
            config: None,
        });
        assert!(!a.has_same_spec_as(&b));
    }

    #[test]
    fn non_nil_fields_reflect_supplied_columns() {
        let mut rec = record(Some(DeviceSpec::default()));
        assert!(rec.non_nil_fields().is_empty());

        rec.meta.generation = Some(3);
        rec.meta.owner = Some("Fleet/f".to_string());
        let fields = rec.non_nil_fields();
        assert_eq!(fields, vec![Column::Generation, Column::Owner]);
    }

    #[test]
    fn rejects_non_numeric_resource_version() {
        let meta = ObjectMeta {
            name: Some("dev".to_string()),
            resource_version: Some("not-a-number".to_string()),
            ..ObjectMeta::default()
        };
        let result = record_from_api::<DeviceKind>(&meta, None, None);
        assert!(matches!(
            result,
            Err(StoreError::IllegalResourceVersionFormat)
        ));
    }

    #[test]
    fn rejects_missing_name() {
        let result = record_from_api::<DeviceKind>(&ObjectMeta::default(), None, None);
        assert!(matches!(result, Err(StoreError::ResourceNameIsNil)));
    }
}
