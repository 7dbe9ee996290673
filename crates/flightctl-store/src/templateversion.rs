//! Template version store facade.
//!
//! Template versions support forward references: a fleet may point at a
//! version that has not been rendered yet. The reference target is a
//! placeholder row with no spec, invisible to reads, which the renderer
//! later fills in through a create-or-update.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use flightctl_api::{TemplateVersion, TemplateVersionList};
use flightctl_core::Result;

use crate::db::{db_err, Db};
use crate::generic::{GenericStore, UpdateOptions};
use crate::list::ListParams;
use crate::model::templateversion::TemplateVersionKind;
use crate::model::{self, fmt_timestamp, resource_table_ddl, KindDef};

/// Store for [`TemplateVersion`] resources.
pub struct TemplateVersionStore {
    db: Db,
    store: GenericStore<TemplateVersionKind, TemplateVersion, TemplateVersionList>,
}

impl TemplateVersionStore {
    /// Create the facade over a database handle.
    #[must_use]
    pub fn new(db: Db) -> Self {
        let store = GenericStore::new(
            db.clone(),
            model::templateversion::from_api,
            model::templateversion::to_api,
            model::templateversion::to_list,
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
            conn.execute_batch(&resource_table_ddl(TemplateVersionKind::TABLE))
                .map_err(db_err)
        })
    }

    /// Insert a placeholder row serving as a forward-reference target. The
    /// row has no spec and stays invisible to reads until rendered. A row
    /// already present (placeholder or rendered) is left untouched.
    ///
    /// # Errors
    ///
    /// Returns a database error if the insert fails.
    pub fn create_placeholder(&self, org_id: Uuid, name: &str, owner: &str) -> Result<()> {
        self.db.with(|conn| {
            conn.execute(
                &format!(
                    "INSERT OR IGNORE INTO {} \
                     (org_id, name, owner, resource_version, created_at) \
                     VALUES (?1, ?2, ?3, 1, ?4)",
                    TemplateVersionKind::TABLE
                ),
                params![
                    org_id.to_string(),
                    name,
                    owner,
                    fmt_timestamp(Utc::now())
                ],
            )
            .map_err(db_err)?;
            Ok(())
        })
    }

    /// Fetch a template version by name. Placeholders are invisible.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent.
    pub fn get(&self, org_id: Uuid, name: &str) -> Result<TemplateVersion> {
        self.store.get(org_id, name)
    }

    /// Render a template version: fills a placeholder in place or creates
    /// the row outright. Returns whether the version was (logically)
    /// created rather than updated.
    ///
    /// # Errors
    ///
    /// Propagates optimistic-concurrency errors.
    pub fn create_or_update(
        &self,
        org_id: Uuid,
        version: &TemplateVersion,
        opts: &UpdateOptions,
    ) -> Result<(TemplateVersion, bool)> {
        self.store.create_or_update(org_id, version, opts, None)
    }

    /// List rendered template versions.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn list(&self, org_id: Uuid, params: &ListParams) -> Result<TemplateVersionList> {
        self.store.list(org_id, params)
    }

    /// Delete a template version. Idempotent; returns whether a rendered
    /// row existed.
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails.
    pub fn delete(&self, org_id: Uuid, name: &str) -> Result<bool> {
        self.store.delete(org_id, name, &[])
    }
}

#[cfg(test)]
mod tests {
    use flightctl_api::{ObjectMeta, TemplateVersionSpec};
    use flightctl_core::{Kind, StoreError};

    use super::*;

    fn tv_store() -> TemplateVersionStore {
        let db = Db::open_in_memory().unwrap();
        let store = TemplateVersionStore::new(db);
        store.initial_migration().unwrap();
        store
    }

    fn version(name: &str) -> TemplateVersion {
        TemplateVersion {
            metadata: ObjectMeta::named(name),
            spec: Some(TemplateVersionSpec {
                fleet: "edge".to_string(),
                device_spec: None,
            }),
            status: None,
        }
    }

    #[test]
    fn placeholders_are_invisible_until_rendered() {
        let store = tv_store();
        let org = Uuid::nil();
        let owner = Kind::Fleet.owner_ref("edge");

        store.create_placeholder(org, "edge-v1", &owner).unwrap();
        assert!(matches!(
            store.get(org, "edge-v1"),
            Err(StoreError::ResourceNotFound)
        ));
        assert!(store
            .list(org, &ListParams::default())
            .unwrap()
            .items
            .is_empty());

        // Rendering the placeholder counts as creating.
        let (rendered, created) = store
            .create_or_update(org, &version("edge-v1"), &UpdateOptions::internal())
            .unwrap();
        assert!(created);
        // The placeholder row was updated in place, so its version history
        // is preserved rather than restarted.
        assert_eq!(rendered.metadata.resource_version.as_deref(), Some("2"));

        assert!(store.get(org, "edge-v1").is_ok());
    }

    #[test]
    fn placeholder_insert_is_idempotent() {
        let store = tv_store();
        let org = Uuid::nil();
        let owner = Kind::Fleet.owner_ref("edge");

        store.create_placeholder(org, "edge-v1", &owner).unwrap();
        store.create_placeholder(org, "edge-v1", &owner).unwrap();

        // A rendered row is not clobbered back into a placeholder.
        store
            .create_or_update(org, &version("edge-v1"), &UpdateOptions::internal())
            .unwrap();
        store.create_placeholder(org, "edge-v1", &owner).unwrap();
        assert!(store.get(org, "edge-v1").is_ok());
    }

    #[test]
    fn deleting_a_placeholder_reports_nothing_deleted() {
        let store = tv_store();
        let org = Uuid::nil();
        store
            .create_placeholder(org, "edge-v1", &Kind::Fleet.owner_ref("edge"))
            .unwrap();
        assert!(!store.delete(org, "edge-v1").unwrap());
    }
}
