//! The generic resource store.
//!
//! One create/read/update/delete/list engine shared by every resource kind,
//! enforcing the resource-level invariants: generation advances only on spec
//! changes, resource version advances on every write, owned resources are
//! shielded from direct API mutation, and concurrent writers are resolved by
//! optimistic concurrency with a bounded retry.
//!
//! The write protocol reads the current row, validates against it, then
//! issues an UPDATE guarded by the resource version it read. A zero
//! rows-affected count means another writer won the race between the read
//! and the write; the whole operation re-runs from the read, up to
//! [`RETRY_ITERATIONS`] times, before the last error is surfaced.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};
use uuid::Uuid;

use flightctl_core::{Kind, Result, StoreError};

use crate::db::{db_err, Db};
use crate::list::{build_count, build_select, continue_values, Continue, ListParams};
use crate::model::{fmt_timestamp, Column, KindDef, Record, SELECT_COLUMNS};

/// Bound on re-running a write that lost the read-to-write race.
const RETRY_ITERATIONS: usize = 10;

/// Converts an API resource into its storage record.
pub type ApiToRecord<K, A> = fn(&A) -> Result<Record<K>>;
/// Converts a storage record into an API resource.
pub type RecordToApi<K, A> = fn(Record<K>) -> Result<A>;
/// Converts a page of records plus pagination metadata into an API list.
pub type RecordsToList<K, L> = fn(Vec<Record<K>>, Option<String>, Option<i64>) -> Result<L>;

/// Hook run before any write, with the existing resource (if any) and the
/// incoming one; an error aborts the operation.
pub type ValidationHook<'a, A> = &'a dyn Fn(Option<&A>, &A) -> Result<()>;

/// A tightly coupled resource removed together with its primary resource.
#[derive(Debug, Clone)]
pub struct AssociatedDelete {
    /// Table holding the associated resource.
    pub table: &'static str,
    /// Organization of the associated resource.
    pub org_id: Uuid,
    /// Name of the associated resource.
    pub name: String,
}

/// Context for a write. A writer acting on behalf of the sync subsystem
/// states so explicitly by setting `bypass_owner_check`.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Whether the write originates from the public API. API writes wipe
    /// annotations unless supplied and are subject to owner protection.
    pub from_api: bool,
    /// Allow spec/label changes on an owned resource. Set only by the
    /// subsystem that owns it.
    pub bypass_owner_check: bool,
    /// Columns to set to NULL even though the incoming resource carries no
    /// value for them.
    pub fields_to_unset: Vec<Column>,
}

impl UpdateOptions {
    /// Options for a write arriving through the public API.
    #[must_use]
    pub fn api() -> Self {
        Self {
            from_api: true,
            ..Self::default()
        }
    }

    /// Options for an internal (system) write.
    #[must_use]
    pub fn internal() -> Self {
        Self::default()
    }

    /// Permit updating a resource this writer owns.
    #[must_use]
    pub fn with_owner_bypass(mut self) -> Self {
        self.bypass_owner_check = true;
        self
    }

    /// Explicitly clear a column as part of the write.
    #[must_use]
    pub fn unset(mut self, column: Column) -> Self {
        self.fields_to_unset.push(column);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    CreateOnly,
    UpdateOnly,
    CreateOrUpdate,
}

/// Outcome of a single write attempt; retry is distinct from failure.
enum Outcome<T> {
    Done(T),
    Retry(StoreError),
    Fail(StoreError),
}

impl<T> Outcome<T> {
    fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(v) => Self::Done(v),
            Err(e) => Self::Fail(e),
        }
    }
}

/// Generic CRUD engine parameterized over a storage model and its API
/// conversion functions.
pub struct GenericStore<K: KindDef, A, L> {
    db: Db,
    api_to_record: ApiToRecord<K, A>,
    record_to_api: RecordToApi<K, A>,
    records_to_list: RecordsToList<K, L>,
    /// Invoked between the read and the guarded write so tests can
    /// interleave a competing writer deterministically.
    write_interleave: Option<Box<dyn Fn() + Send + Sync>>,
}

impl<K: KindDef, A, L> GenericStore<K, A, L> {
    /// Create a store for one resource kind.
    pub fn new(
        db: Db,
        api_to_record: ApiToRecord<K, A>,
        record_to_api: RecordToApi<K, A>,
        records_to_list: RecordsToList<K, L>,
    ) -> Self {
        Self {
            db,
            api_to_record,
            record_to_api,
            records_to_list,
            write_interleave: None,
        }
    }

    #[cfg(test)]
    fn set_write_interleave(&mut self, hook: impl Fn() + Send + Sync + 'static) {
        self.write_interleave = Some(Box::new(hook));
    }

    /// Insert a new resource with generation and resource version 1.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateName`] if a resource with the same
    /// name already exists in the organization.
    pub fn create(&self, org_id: Uuid, resource: &A) -> Result<A> {
        match self.create_or_update_once(
            org_id,
            resource,
            &UpdateOptions::api(),
            Mode::CreateOnly,
            None,
        ) {
            Outcome::Done((resource, _)) => Ok(resource),
            Outcome::Retry(err) | Outcome::Fail(err) => Err(err),
        }
    }

    /// Update an existing resource.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ResourceNotFound`] if the resource does not
    /// exist, [`StoreError::ResourceVersionConflict`] on a stale expected
    /// resource version, and [`StoreError::UpdatingResourceWithOwnerNotAllowed`]
    /// when owner protection rejects the write.
    pub fn update(
        &self,
        org_id: Uuid,
        resource: &A,
        opts: &UpdateOptions,
        validation: Option<ValidationHook<'_, A>>,
    ) -> Result<A> {
        let (updated, _) =
            self.retry_create_or_update(org_id, resource, opts, Mode::UpdateOnly, validation)?;
        Ok(updated)
    }

    /// Update an existing resource or create it when absent. A placeholder
    /// row (no spec) counts as absent.
    ///
    /// Returns the resulting resource and whether it was created.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`GenericStore::update`], minus
    /// [`StoreError::ResourceNotFound`].
    pub fn create_or_update(
        &self,
        org_id: Uuid,
        resource: &A,
        opts: &UpdateOptions,
        validation: Option<ValidationHook<'_, A>>,
    ) -> Result<(A, bool)> {
        self.retry_create_or_update(org_id, resource, opts, Mode::CreateOrUpdate, validation)
    }

    /// Fetch a resource by name. Placeholder rows are invisible.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ResourceNotFound`] if absent.
    pub fn get(&self, org_id: Uuid, name: &str) -> Result<A> {
        let record = self.db.with(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM {} \
                     WHERE org_id = ?1 AND name = ?2 AND spec IS NOT NULL",
                    K::TABLE
                ),
                params![org_id.to_string(), name],
                Record::<K>::from_row,
            )
            .map_err(db_err)
        })?;
        (self.record_to_api)(record)
    }

    /// Delete a resource and, in the same transaction, any associated
    /// resources. Deleting a resource that does not exist is not an error.
    ///
    /// Returns whether the primary row was actually deleted, so callers can
    /// skip side effects for an already-gone resource.
    ///
    /// # Errors
    ///
    /// Returns a database error if any delete fails; the transaction rolls
    /// back as a whole.
    pub fn delete(
        &self,
        org_id: Uuid,
        name: &str,
        associated: &[AssociatedDelete],
    ) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE org_id = ?1 AND name = ?2 AND spec IS NOT NULL",
            K::TABLE
        );
        if associated.is_empty() {
            return self.db.with(|conn| {
                let affected = conn
                    .execute(&sql, params![org_id.to_string(), name])
                    .map_err(db_err)?;
                Ok(affected > 0)
            });
        }

        self.db.transaction(|tx| {
            let affected = tx
                .execute(&sql, params![org_id.to_string(), name])
                .map_err(db_err)?;
            for resource in associated {
                tx.execute(
                    &format!(
                        "DELETE FROM {} WHERE org_id = ?1 AND name = ?2 AND spec IS NOT NULL",
                        resource.table
                    ),
                    params![resource.org_id.to_string(), resource.name],
                )
                .map_err(db_err)?;
            }
            Ok(affected > 0)
        })
    }

    /// Replace the status payload and bump the resource version.
    ///
    /// Status updates are last-writer-wins, with no resource-version
    /// precondition. Generation is never touched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ResourceNotFound`] if the resource does not
    /// exist.
    pub fn update_status(&self, org_id: Uuid, resource: &A) -> Result<A> {
        let record = (self.api_to_record)(resource)?;
        let status = record.status_json()?;

        let updated = self.db.transaction(|tx| {
            let affected = tx
                .execute(
                    &format!(
                        "UPDATE {} SET status = ?1, \
                         resource_version = COALESCE(resource_version, 0) + 1 \
                         WHERE org_id = ?2 AND name = ?3",
                        K::TABLE
                    ),
                    params![status, org_id.to_string(), record.meta.name],
                )
                .map_err(db_err)?;
            if affected == 0 {
                return Err(StoreError::ResourceNotFound);
            }
            tx.query_row(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM {} WHERE org_id = ?1 AND name = ?2",
                    K::TABLE
                ),
                params![org_id.to_string(), record.meta.name],
                Record::<K>::from_row,
            )
            .map_err(db_err)
        })?;
        (self.record_to_api)(updated)
    }

    /// List resources matching the given parameters, paginated.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails or a serialization error
    /// for a malformed continuation token.
    pub fn list(&self, org_id: Uuid, params: &ListParams) -> Result<L> {
        let limit = params.limit;
        // Request one row more than asked for to learn whether a
        // continuation is needed.
        let fetch = if limit > 0 { Some(limit + 1) } else { None };
        let (sql, values) = build_select(K::TABLE, SELECT_COLUMNS, org_id, params, fetch)?;

        let mut records: Vec<Record<K>> = self.db.with(|conn| {
            let mut stmt = conn.prepare(&sql).map_err(db_err)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), Record::<K>::from_row)
                .map_err(db_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
        })?;

        let mut next_continue = None;
        let mut remaining = None;
        if limit > 0 && records.len() > limit {
            if let Some(boundary) = records.pop() {
                let boundary_values = continue_values(&boundary.meta, params.sort_by);
                let count = match &params.cont {
                    // The token knows how many items were left at the
                    // previous boundary; there is always at least the
                    // trimmed row itself.
                    Some(cont) => (cont.count - to_i64(limit)).max(1),
                    None => {
                        let (csql, cvalues) =
                            build_count(K::TABLE, org_id, params, Some(&boundary_values))?;
                        self.db.with(|conn| {
                            conn.query_row(&csql, params_from_iter(cvalues.iter()), |row| {
                                row.get::<_, i64>(0)
                            })
                            .map_err(db_err)
                        })?
                    }
                };
                next_continue = Some(Continue::new(boundary_values, count).encode()?);
                remaining = Some(count);
            }
        }
        (self.records_to_list)(records, next_continue, remaining)
    }

    /// Count resources matching the given filters.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn count(&self, org_id: Uuid, params: &ListParams) -> Result<i64> {
        let (sql, values) = build_count(K::TABLE, org_id, params, None)?;
        self.db.with(|conn| {
            conn.query_row(&sql, params_from_iter(values.iter()), |row| {
                row.get::<_, i64>(0)
            })
            .map_err(db_err)
        })
    }

    fn retry_create_or_update(
        &self,
        org_id: Uuid,
        resource: &A,
        opts: &UpdateOptions,
        mode: Mode,
        validation: Option<ValidationHook<'_, A>>,
    ) -> Result<(A, bool)> {
        let mut attempts = 0;
        loop {
            match self.create_or_update_once(org_id, resource, opts, mode, validation) {
                Outcome::Done(value) => return Ok(value),
                Outcome::Fail(err) => return Err(err),
                Outcome::Retry(err) => {
                    if attempts >= RETRY_ITERATIONS {
                        return Err(err);
                    }
                    attempts += 1;
                    tracing::debug!(
                        kind = %K::KIND,
                        attempt = attempts,
                        "write lost the race, retrying"
                    );
                }
            }
        }
    }

    fn create_or_update_once(
        &self,
        org_id: Uuid,
        resource: &A,
        opts: &UpdateOptions,
        mode: Mode,
        validation: Option<ValidationHook<'_, A>>,
    ) -> Outcome<(A, bool)> {
        let mut record = match (self.api_to_record)(resource) {
            Ok(record) => record,
            Err(err) => return Outcome::Fail(err),
        };
        record.meta.org_id = org_id;
        if opts.from_api {
            // Only internal writers set annotations; absent means
            // "preserve what is stored".
            record.meta.annotations = None;
        }

        let existing = match self.get_existing(org_id, &record.meta.name) {
            Ok(existing) => existing,
            Err(err) => return Outcome::Fail(err),
        };
        let creating = existing.as_ref().is_none_or(Record::has_nil_spec);

        if let Some(validate) = validation {
            let before = match existing
                .clone()
                .map(|record| (self.record_to_api)(record))
                .transpose()
            {
                Ok(before) => before,
                Err(err) => return Outcome::Fail(err),
            };
            let after = match (self.record_to_api)(record.clone()) {
                Ok(after) => after,
                Err(err) => return Outcome::Fail(err),
            };
            if let Err(err) = validate(before.as_ref(), &after) {
                return Outcome::Fail(err);
            }
        }

        if !creating && mode == Mode::CreateOnly {
            return Outcome::Fail(StoreError::DuplicateName);
        }
        if creating && mode == Mode::UpdateOnly {
            // Also covers placeholder rows: they are invisible to
            // update-only callers.
            return Outcome::Fail(StoreError::ResourceNotFound);
        }

        if let Some(hook) = &self.write_interleave {
            hook();
        }

        let written = match existing {
            None => self.create_row(&mut record),
            Some(existing) => self.update_row(&existing, &mut record, opts),
        };
        match written {
            Outcome::Done(()) => {}
            Outcome::Retry(err) => return Outcome::Retry(err),
            Outcome::Fail(err) => return Outcome::Fail(err),
        }

        Outcome::from_result((self.record_to_api)(record).map(|resource| (resource, creating)))
    }

    fn get_existing(&self, org_id: Uuid, name: &str) -> Result<Option<Record<K>>> {
        self.db.with(|conn| {
            match conn.query_row(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM {} WHERE org_id = ?1 AND name = ?2",
                    K::TABLE
                ),
                params![org_id.to_string(), name],
                Record::<K>::from_row,
            ) {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(err) => Err(db_err(err)),
            }
        })
    }

    fn create_row(&self, record: &mut Record<K>) -> Outcome<()> {
        record.meta.generation = Some(1);
        record.meta.resource_version = Some(1);

        let spec = match record.spec_json() {
            Ok(spec) => spec,
            Err(err) => return Outcome::Fail(err),
        };
        let status = match record.status_json() {
            Ok(status) => status,
            Err(err) => return Outcome::Fail(err),
        };
        let labels = match record.column_value(Column::Labels) {
            Ok(labels) => labels,
            Err(err) => return Outcome::Fail(err),
        };
        let annotations = match record.column_value(Column::Annotations) {
            Ok(annotations) => annotations,
            Err(err) => return Outcome::Fail(err),
        };

        let result = self.db.with(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {} (org_id, name, owner, generation, resource_version, \
                     labels, annotations, spec, status, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    K::TABLE
                ),
                params![
                    record.meta.org_id.to_string(),
                    record.meta.name,
                    record.meta.owner,
                    record.meta.generation,
                    record.meta.resource_version,
                    labels,
                    annotations,
                    spec,
                    status,
                    fmt_timestamp(record.meta.created_at),
                ],
            )
            .map_err(db_err)?;
            Ok(())
        });
        match result {
            Ok(()) => Outcome::Done(()),
            // A concurrent creator won; a retrying caller will update.
            Err(StoreError::DuplicateName) => Outcome::Retry(StoreError::DuplicateName),
            Err(err) => Outcome::Fail(err),
        }
    }

    fn update_row(
        &self,
        existing: &Record<K>,
        record: &mut Record<K>,
        opts: &UpdateOptions,
    ) -> Outcome<()> {
        let has_owner = existing.meta.owner.as_deref().is_some_and(|o| !o.is_empty());
        let owner_protected = opts.from_api && has_owner && !opts.bypass_owner_check;

        if record.has_same_spec_as(existing) {
            record.meta.generation = existing.meta.generation;
        } else {
            if owner_protected {
                return Outcome::Fail(StoreError::UpdatingResourceWithOwnerNotAllowed);
            }
            // The spec changed, so this is a new desired state.
            record.meta.generation = Some(existing.meta.generation.unwrap_or(0) + 1);
        }

        // Fleet labels select devices, so they are part of what the owner
        // manages. Absent labels mean "preserve" and are not a change.
        if owner_protected
            && K::KIND == Kind::Fleet
            && record.meta.labels.is_some()
            && record.meta.labels != existing.meta.labels
        {
            return Outcome::Fail(StoreError::UpdatingResourceWithOwnerNotAllowed);
        }

        if record.meta.resource_version.is_some()
            && record.meta.resource_version != existing.meta.resource_version
        {
            return Outcome::Fail(StoreError::ResourceVersionConflict);
        }

        let stored_version = existing.meta.resource_version;
        record.meta.resource_version = Some(stored_version.unwrap_or(0) + 1);

        let mut columns = vec![Column::Spec];
        for column in record.non_nil_fields() {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        for column in &opts.fields_to_unset {
            if !columns.contains(column) {
                columns.push(*column);
            }
        }

        let mut sql = format!("UPDATE {} SET ", K::TABLE);
        let mut values = Vec::with_capacity(columns.len() + 3);
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(column.name());
            sql.push_str(" = ?");
            match record.column_value(*column) {
                Ok(value) => values.push(value),
                Err(err) => return Outcome::Fail(err),
            }
        }
        sql.push_str(
            " WHERE org_id = ? AND name = ? AND (resource_version IS NULL OR resource_version = ?)",
        );
        values.push(Value::Text(record.meta.org_id.to_string()));
        values.push(Value::Text(record.meta.name.clone()));
        values.push(stored_version.map_or(Value::Null, Value::Integer));

        let affected = match self.db.with(|conn| {
            conn.execute(&sql, params_from_iter(values.iter()))
                .map_err(db_err)
        }) {
            Ok(affected) => affected,
            Err(err) => return Outcome::Fail(err),
        };
        if affected == 0 {
            return Outcome::Retry(StoreError::NoRowsUpdated);
        }

        // Columns absent from the update keep their stored value; copy them
        // back so the returned resource reflects database state.
        if record.meta.owner.is_none() && !opts.fields_to_unset.contains(&Column::Owner) {
            record.meta.owner = existing.meta.owner.clone();
        }
        if record.meta.annotations.is_none()
            && !opts.fields_to_unset.contains(&Column::Annotations)
        {
            record.meta.annotations = existing.meta.annotations.clone();
        }
        if record.meta.labels.is_none() && !opts.fields_to_unset.contains(&Column::Labels) {
            record.meta.labels = existing.meta.labels.clone();
        }
        record.meta.created_at = existing.meta.created_at;
        Outcome::Done(())
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn to_i64(value: usize) -> i64 {
    value as i64
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use flightctl_api::{Device, DeviceList, DeviceSpec, ObjectMeta};

    use super::*;
    use crate::model::device::{self, DeviceKind};
    use crate::model::resource_table_ddl;

    type DeviceGenericStore = GenericStore<DeviceKind, Device, DeviceList>;

    fn test_store() -> DeviceGenericStore {
        let db = Db::open_in_memory().unwrap();
        db.with(|conn| {
            conn.execute_batch(&resource_table_ddl("devices"))
                .map_err(db_err)
        })
        .unwrap();
        GenericStore::new(db, device::from_api, device::to_api, device::to_list)
    }

    fn device(name: &str, image: &str) -> Device {
        Device {
            metadata: ObjectMeta::named(name),
            spec: Some(DeviceSpec {
                os_image: Some(image.to_string()),
                config: None,
            }),
            status: None,
        }
    }

    fn resource_version(device: &Device) -> i64 {
        device
            .metadata
            .resource_version
            .as_deref()
            .unwrap()
            .parse()
            .unwrap()
    }

    #[test]
    fn create_starts_counters_at_one() {
        let store = test_store();
        let created = store.create(Uuid::nil(), &device("dev-1", "img:1")).unwrap();
        assert_eq!(created.metadata.generation, Some(1));
        assert_eq!(resource_version(&created), 1);
    }

    #[test]
    fn create_rejects_duplicate_names() {
        let store = test_store();
        store.create(Uuid::nil(), &device("dev-1", "img:1")).unwrap();
        let err = store
            .create(Uuid::nil(), &device("dev-1", "img:2"))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName));
    }

    #[test]
    fn names_are_scoped_by_org() {
        let store = test_store();
        let org_a = Uuid::nil();
        let org_b = Uuid::new_v4();
        store.create(org_a, &device("dev-1", "img:1")).unwrap();
        store.create(org_b, &device("dev-1", "img:1")).unwrap();
        assert!(store.get(org_a, "dev-1").is_ok());
        assert!(store.get(org_b, "dev-1").is_ok());
    }

    #[test]
    fn get_missing_resource_is_not_found() {
        let store = test_store();
        assert!(matches!(
            store.get(Uuid::nil(), "ghost"),
            Err(StoreError::ResourceNotFound)
        ));
    }

    #[test]
    fn update_missing_resource_is_not_found() {
        let store = test_store();
        let err = store
            .update(
                Uuid::nil(),
                &device("ghost", "img:1"),
                &UpdateOptions::api(),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::ResourceNotFound));
    }

    #[test]
    fn generation_advances_only_on_spec_change() {
        let store = test_store();
        let org = Uuid::nil();
        store.create(org, &device("dev-1", "img:1")).unwrap();

        // Same spec, different metadata: generation stays put.
        let mut same = device("dev-1", "img:1");
        same.metadata.labels = Some(BTreeMap::from([("site".to_string(), "x".to_string())]));
        let updated = store.update(org, &same, &UpdateOptions::api(), None).unwrap();
        assert_eq!(resource_version(&updated), 2);
        assert_eq!(updated.metadata.generation, Some(1));
        let stored = store.get(org, "dev-1").unwrap();
        assert_eq!(stored.metadata.generation, Some(1));

        // New spec: generation advances by exactly one.
        let updated = store
            .update(org, &device("dev-1", "img:2"), &UpdateOptions::api(), None)
            .unwrap();
        assert_eq!(updated.metadata.generation, Some(2));
        assert_eq!(resource_version(&updated), 3);
    }

    #[test]
    fn owner_protection_blocks_api_spec_changes() {
        let store = test_store();
        let org = Uuid::nil();
        let mut owned = device("dev-1", "img:1");
        owned.metadata.owner = Some("Fleet/edge".to_string());
        store.create(org, &owned).unwrap();

        let err = store
            .update(org, &device("dev-1", "img:2"), &UpdateOptions::api(), None)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::UpdatingResourceWithOwnerNotAllowed
        ));

        // The owning subsystem declares itself and is allowed through.
        let updated = store
            .update(
                org,
                &device("dev-1", "img:2"),
                &UpdateOptions::api().with_owner_bypass(),
                None,
            )
            .unwrap();
        assert_eq!(updated.metadata.generation, Some(2));
        // Owner is preserved even though the incoming resource omitted it.
        assert_eq!(updated.metadata.owner.as_deref(), Some("Fleet/edge"));
    }

    #[test]
    fn internal_writers_may_update_owned_resources() {
        let store = test_store();
        let org = Uuid::nil();
        let mut owned = device("dev-1", "img:1");
        owned.metadata.owner = Some("Fleet/edge".to_string());
        store.create(org, &owned).unwrap();

        let updated = store
            .update(
                org,
                &device("dev-1", "img:2"),
                &UpdateOptions::internal(),
                None,
            )
            .unwrap();
        assert_eq!(updated.metadata.generation, Some(2));
    }

    #[test]
    fn stale_resource_version_conflicts_without_retry() {
        let store = test_store();
        let org = Uuid::nil();
        store.create(org, &device("dev-1", "img:1")).unwrap();
        store
            .update(org, &device("dev-1", "img:2"), &UpdateOptions::api(), None)
            .unwrap();

        let mut stale = device("dev-1", "img:3");
        stale.metadata.resource_version = Some("1".to_string());
        let err = store
            .update(org, &stale, &UpdateOptions::api(), None)
            .unwrap_err();
        assert!(matches!(err, StoreError::ResourceVersionConflict));
    }

    #[test]
    fn matching_resource_version_precondition_succeeds() {
        let store = test_store();
        let org = Uuid::nil();
        store.create(org, &device("dev-1", "img:1")).unwrap();

        let mut expected = device("dev-1", "img:2");
        expected.metadata.resource_version = Some("1".to_string());
        let updated = store
            .update(org, &expected, &UpdateOptions::api(), None)
            .unwrap();
        assert_eq!(resource_version(&updated), 2);
    }

    #[test]
    fn api_writes_wipe_annotations_and_preserve_stored_ones() {
        let store = test_store();
        let org = Uuid::nil();
        store.create(org, &device("dev-1", "img:1")).unwrap();

        // An internal writer records an annotation.
        let mut annotated = device("dev-1", "img:1");
        annotated.metadata.annotations =
            Some(BTreeMap::from([("sync".to_string(), "abc".to_string())]));
        store
            .update(org, &annotated, &UpdateOptions::internal(), None)
            .unwrap();

        // An API write carrying annotations does not overwrite them.
        let mut api_write = device("dev-1", "img:2");
        api_write.metadata.annotations =
            Some(BTreeMap::from([("sync".to_string(), "evil".to_string())]));
        let updated = store
            .update(org, &api_write, &UpdateOptions::api(), None)
            .unwrap();
        assert_eq!(
            updated.metadata.annotations.unwrap().get("sync").unwrap(),
            "abc"
        );
    }

    #[test]
    fn unset_fields_are_cleared_not_preserved() {
        let store = test_store();
        let org = Uuid::nil();
        let mut owned = device("dev-1", "img:1");
        owned.metadata.owner = Some("Fleet/edge".to_string());
        store.create(org, &owned).unwrap();

        let updated = store
            .update(
                org,
                &device("dev-1", "img:1"),
                &UpdateOptions::internal().unset(Column::Owner),
                None,
            )
            .unwrap();
        assert_eq!(updated.metadata.owner, None);
        assert_eq!(
            store.get(org, "dev-1").unwrap().metadata.owner,
            None
        );
    }

    #[test]
    fn validation_hook_rejects_before_any_write() {
        let store = test_store();
        let org = Uuid::nil();
        store.create(org, &device("dev-1", "img:1")).unwrap();

        let validate: &dyn Fn(Option<&Device>, &Device) -> Result<()> = &|before, after| {
            assert!(before.is_some());
            assert_eq!(
                after.spec.as_ref().unwrap().os_image.as_deref(),
                Some("img:2")
            );
            Err(StoreError::ResourceIsNil)
        };
        let err = store
            .update(
                org,
                &device("dev-1", "img:2"),
                &UpdateOptions::api(),
                Some(validate),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::ResourceIsNil));

        // Nothing was written.
        let current = store.get(org, "dev-1").unwrap();
        assert_eq!(resource_version(&current), 1);
    }

    #[test]
    fn update_status_bumps_version_but_not_generation() {
        let store = test_store();
        let org = Uuid::nil();
        store.create(org, &device("dev-1", "img:1")).unwrap();

        let mut reported = device("dev-1", "img:1");
        reported.status = Some(flightctl_api::DeviceStatus {
            os_image: Some("img:1".to_string()),
            ..flightctl_api::DeviceStatus::default()
        });
        let updated = store.update_status(org, &reported).unwrap();
        assert_eq!(updated.metadata.generation, Some(1));
        assert_eq!(resource_version(&updated), 2);
        assert_eq!(
            updated.status.unwrap().os_image.as_deref(),
            Some("img:1")
        );
    }

    #[test]
    fn update_status_on_missing_resource_is_not_found() {
        let store = test_store();
        let err = store
            .update_status(Uuid::nil(), &device("ghost", "img:1"))
            .unwrap_err();
        assert!(matches!(err, StoreError::ResourceNotFound));
    }

    #[test]
    fn delete_is_idempotent() {
        let store = test_store();
        let org = Uuid::nil();
        store.create(org, &device("dev-1", "img:1")).unwrap();

        assert!(store.delete(org, "dev-1", &[]).unwrap());
        assert!(!store.delete(org, "dev-1", &[]).unwrap());
    }

    #[test]
    fn create_or_update_reports_creation() {
        let store = test_store();
        let org = Uuid::nil();

        let (_, created) = store
            .create_or_update(org, &device("dev-1", "img:1"), &UpdateOptions::api(), None)
            .unwrap();
        assert!(created);

        let (updated, created) = store
            .create_or_update(org, &device("dev-1", "img:2"), &UpdateOptions::api(), None)
            .unwrap();
        assert!(!created);
        assert_eq!(updated.metadata.generation, Some(2));
    }

    #[test]
    fn lost_race_is_retried_to_success() {
        let store = Arc::new(test_store());
        let org = Uuid::nil();
        store.create(org, &device("dev-1", "img:1")).unwrap();

        // Between the read and the guarded write, a competing writer bumps
        // the resource version, forcing the first attempt to miss.
        let competitor = Arc::new(test_store_sharing(&store));
        let fired = Arc::new(AtomicUsize::new(0));
        let mut racing = test_store_sharing(&store);
        {
            let competitor = Arc::clone(&competitor);
            let fired = Arc::clone(&fired);
            racing.set_write_interleave(move || {
                if fired.fetch_add(1, Ordering::SeqCst) == 0 {
                    competitor
                        .update(
                            Uuid::nil(),
                            &device("dev-1", "img:competitor"),
                            &UpdateOptions::api(),
                            None,
                        )
                        .unwrap();
                }
            });
        }

        let updated = racing
            .update(org, &device("dev-1", "img:2"), &UpdateOptions::api(), None)
            .unwrap();
        // Both writes landed: competitor took version 2, the retried write
        // took version 3. Neither was lost.
        assert_eq!(resource_version(&updated), 3);
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    fn test_store_sharing(store: &DeviceGenericStore) -> DeviceGenericStore {
        GenericStore::new(
            store.db.clone(),
            device::from_api,
            device::to_api,
            device::to_list,
        )
    }
}
