//! Repository store facade.
//!
//! Besides generic CRUD, repositories track which fleets and devices
//! reference them, so config changes in a repository can be fanned out to
//! the resources consuming it. The reference sets are overwritten
//! wholesale inside one transaction.

use rusqlite::params;
use uuid::Uuid;

use flightctl_api::{Repository, RepositoryList};
use flightctl_core::Result;

use crate::db::{db_err, Db};
use crate::generic::{GenericStore, UpdateOptions};
use crate::list::ListParams;
use crate::model::repository::RepositoryKind;
use crate::model::{self, resource_table_ddl, KindDef};

/// Store for [`Repository`] resources.
pub struct RepositoryStore {
    db: Db,
    store: GenericStore<RepositoryKind, Repository, RepositoryList>,
}

impl RepositoryStore {
    /// Create the facade over a database handle.
    #[must_use]
    pub fn new(db: Db) -> Self {
        let store = GenericStore::new(
            db.clone(),
            model::repository::from_api,
            model::repository::to_api,
            model::repository::to_list,
        );
        Self { db, store }
    }

    /// Create the backing table and the reference join tables.
    ///
    /// # Errors
    ///
    /// Returns a database error if the DDL fails.
    pub fn initial_migration(&self) -> Result<()> {
        self.db.with(|conn| {
            conn.execute_batch(&resource_table_ddl(RepositoryKind::TABLE))
                .map_err(db_err)?;
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS repository_fleet_refs (\n\
                 \torg_id TEXT NOT NULL,\n\
                 \trepository_name TEXT NOT NULL,\n\
                 \tfleet_name TEXT NOT NULL,\n\
                 \tPRIMARY KEY (org_id, repository_name, fleet_name)\n\
                 );\n\
                 CREATE TABLE IF NOT EXISTS repository_device_refs (\n\
                 \torg_id TEXT NOT NULL,\n\
                 \trepository_name TEXT NOT NULL,\n\
                 \tdevice_name TEXT NOT NULL,\n\
                 \tPRIMARY KEY (org_id, repository_name, device_name)\n\
                 );",
            )
            .map_err(db_err)
        })
    }

    /// Insert a new repository.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` if one with this name exists.
    pub fn create(&self, org_id: Uuid, repository: &Repository) -> Result<Repository> {
        self.store.create(org_id, repository)
    }

    /// Fetch a repository by name.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent.
    pub fn get(&self, org_id: Uuid, name: &str) -> Result<Repository> {
        self.store.get(org_id, name)
    }

    /// Update an existing repository.
    ///
    /// # Errors
    ///
    /// Propagates optimistic-concurrency and owner-protection errors.
    pub fn update(
        &self,
        org_id: Uuid,
        repository: &Repository,
        opts: &UpdateOptions,
    ) -> Result<Repository> {
        self.store.update(org_id, repository, opts, None)
    }

    /// Update a repository or create it when absent; returns whether it was
    /// created.
    ///
    /// # Errors
    ///
    /// Propagates optimistic-concurrency and owner-protection errors.
    pub fn create_or_update(
        &self,
        org_id: Uuid,
        repository: &Repository,
        opts: &UpdateOptions,
    ) -> Result<(Repository, bool)> {
        self.store.create_or_update(org_id, repository, opts, None)
    }

    /// Replace the reported status of a repository.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent.
    pub fn update_status(&self, org_id: Uuid, repository: &Repository) -> Result<Repository> {
        self.store.update_status(org_id, repository)
    }

    /// List repositories.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn list(&self, org_id: Uuid, params: &ListParams) -> Result<RepositoryList> {
        self.store.list(org_id, params)
    }

    /// Delete a repository and its reference rows. Idempotent; returns
    /// whether the repository row existed.
    ///
    /// # Errors
    ///
    /// Returns a database error if the transaction fails.
    pub fn delete(&self, org_id: Uuid, name: &str) -> Result<bool> {
        self.db.transaction(|tx| {
            let affected = tx
                .execute(
                    &format!(
                        "DELETE FROM {} WHERE org_id = ?1 AND name = ?2 AND spec IS NOT NULL",
                        RepositoryKind::TABLE
                    ),
                    params![org_id.to_string(), name],
                )
                .map_err(db_err)?;
            for table in ["repository_fleet_refs", "repository_device_refs"] {
                tx.execute(
                    &format!("DELETE FROM {table} WHERE org_id = ?1 AND repository_name = ?2"),
                    params![org_id.to_string(), name],
                )
                .map_err(db_err)?;
            }
            Ok(affected > 0)
        })
    }

    /// Replace the set of fleets referencing this repository.
    ///
    /// # Errors
    ///
    /// Returns a database error if the transaction fails.
    pub fn overwrite_fleet_refs(
        &self,
        org_id: Uuid,
        name: &str,
        fleet_names: &[&str],
    ) -> Result<()> {
        self.overwrite_refs("repository_fleet_refs", "fleet_name", org_id, name, fleet_names)
    }

    /// Fleets currently referencing this repository, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn fleet_refs(&self, org_id: Uuid, name: &str) -> Result<Vec<String>> {
        self.refs("repository_fleet_refs", "fleet_name", org_id, name)
    }

    /// Replace the set of devices referencing this repository.
    ///
    /// # Errors
    ///
    /// Returns a database error if the transaction fails.
    pub fn overwrite_device_refs(
        &self,
        org_id: Uuid,
        name: &str,
        device_names: &[&str],
    ) -> Result<()> {
        self.overwrite_refs(
            "repository_device_refs",
            "device_name",
            org_id,
            name,
            device_names,
        )
    }

    /// Devices currently referencing this repository, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn device_refs(&self, org_id: Uuid, name: &str) -> Result<Vec<String>> {
        self.refs("repository_device_refs", "device_name", org_id, name)
    }

    fn overwrite_refs(
        &self,
        table: &str,
        column: &str,
        org_id: Uuid,
        name: &str,
        referents: &[&str],
    ) -> Result<()> {
        self.db.transaction(|tx| {
            tx.execute(
                &format!("DELETE FROM {table} WHERE org_id = ?1 AND repository_name = ?2"),
                params![org_id.to_string(), name],
            )
            .map_err(db_err)?;
            for referent in referents {
                tx.execute(
                    &format!(
                        "INSERT INTO {table} (org_id, repository_name, {column}) \
                         VALUES (?1, ?2, ?3)"
                    ),
                    params![org_id.to_string(), name, referent],
                )
                .map_err(db_err)?;
            }
            Ok(())
        })
    }

    fn refs(&self, table: &str, column: &str, org_id: Uuid, name: &str) -> Result<Vec<String>> {
        self.db.with(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {column} FROM {table} \
                     WHERE org_id = ?1 AND repository_name = ?2 ORDER BY {column}"
                ))
                .map_err(db_err)?;
            let rows = stmt
                .query_map(params![org_id.to_string(), name], |row| row.get(0))
                .map_err(db_err)?;
            rows.collect::<rusqlite::Result<Vec<String>>>().map_err(db_err)
        })
    }
}

#[cfg(test)]
mod tests {
    use flightctl_api::{ObjectMeta, RepositorySpec};

    use super::*;

    fn repo_store() -> RepositoryStore {
        let db = Db::open_in_memory().unwrap();
        let store = RepositoryStore::new(db);
        store.initial_migration().unwrap();
        store
    }

    fn repository(name: &str) -> Repository {
        Repository {
            metadata: ObjectMeta::named(name),
            spec: Some(RepositorySpec {
                url: "https://git.example.com/config.git".to_string(),
                revision: None,
            }),
            status: None,
        }
    }

    #[test]
    fn reference_sets_are_overwritten_wholesale() {
        let store = repo_store();
        let org = Uuid::nil();
        store.create(org, &repository("config")).unwrap();

        store
            .overwrite_fleet_refs(org, "config", &["edge", "factory"])
            .unwrap();
        assert_eq!(store.fleet_refs(org, "config").unwrap(), vec!["edge", "factory"]);

        store.overwrite_fleet_refs(org, "config", &["edge"]).unwrap();
        assert_eq!(store.fleet_refs(org, "config").unwrap(), vec!["edge"]);

        store.overwrite_device_refs(org, "config", &["dev-1"]).unwrap();
        assert_eq!(store.device_refs(org, "config").unwrap(), vec!["dev-1"]);
    }

    #[test]
    fn delete_removes_references_too() {
        let store = repo_store();
        let org = Uuid::nil();
        store.create(org, &repository("config")).unwrap();
        store.overwrite_fleet_refs(org, "config", &["edge"]).unwrap();

        assert!(store.delete(org, "config").unwrap());
        assert!(store.fleet_refs(org, "config").unwrap().is_empty());
        assert!(!store.delete(org, "config").unwrap());
    }
}
