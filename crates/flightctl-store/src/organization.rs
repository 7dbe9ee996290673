//! Organization store facade.
//!
//! Organizations partition every other resource, so they live in their own
//! global table rather than going through the org-scoped generic store. A
//! default organization (the nil UUID) is seeded at migration time for
//! single-tenant deployments.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use flightctl_api::{ListMeta, Organization, OrganizationList};
use flightctl_core::Result;

use crate::db::{db_err, Db};
use crate::model::fmt_timestamp;

/// The organization every request falls into when none is selected.
pub const DEFAULT_ORG_ID: Uuid = Uuid::nil();

/// Store for [`Organization`] resources.
pub struct OrganizationStore {
    db: Db,
}

impl OrganizationStore {
    /// Create the facade over a database handle.
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Create the backing table and seed the default organization.
    ///
    /// # Errors
    ///
    /// Returns a database error if the DDL fails.
    pub fn initial_migration(&self) -> Result<()> {
        self.db.with(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS organizations (\n\
                 \tid TEXT PRIMARY KEY,\n\
                 \tname TEXT NOT NULL UNIQUE,\n\
                 \tdisplay_name TEXT,\n\
                 \tcreated_at TEXT NOT NULL\n\
                 );",
            )
            .map_err(db_err)?;
            conn.execute(
                "INSERT OR IGNORE INTO organizations (id, name, display_name, created_at) \
                 VALUES (?1, 'default', 'Default organization', ?2)",
                params![DEFAULT_ORG_ID.to_string(), fmt_timestamp(Utc::now())],
            )
            .map_err(db_err)?;
            Ok(())
        })
    }

    /// Insert a new organization.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` when the id or name is already taken.
    pub fn create(&self, organization: &Organization) -> Result<Organization> {
        let created_at = organization.created_at.unwrap_or_else(Utc::now);
        self.db.with(|conn| {
            conn.execute(
                "INSERT INTO organizations (id, name, display_name, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    organization.id.to_string(),
                    organization.name,
                    organization.display_name,
                    fmt_timestamp(created_at),
                ],
            )
            .map_err(db_err)?;
            Ok(())
        })?;

        let mut stored = organization.clone();
        stored.created_at = Some(created_at);
        Ok(stored)
    }

    /// Fetch an organization by id.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent.
    pub fn get(&self, id: Uuid) -> Result<Organization> {
        self.db.with(|conn| {
            conn.query_row(
                "SELECT id, name, display_name, created_at FROM organizations WHERE id = ?1",
                params![id.to_string()],
                row_to_organization,
            )
            .map_err(db_err)
        })
    }

    /// List all organizations, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn list(&self) -> Result<OrganizationList> {
        let items = self.db.with(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, name, display_name, created_at FROM organizations ORDER BY name",
                )
                .map_err(db_err)?;
            let rows = stmt.query_map([], row_to_organization).map_err(db_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
        })?;
        Ok(OrganizationList {
            items,
            metadata: ListMeta::default(),
        })
    }

    /// Delete an organization. Idempotent; returns whether the row existed.
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails.
    pub fn delete(&self, id: Uuid) -> Result<bool> {
        self.db.with(|conn| {
            let affected = conn
                .execute(
                    "DELETE FROM organizations WHERE id = ?1",
                    params![id.to_string()],
                )
                .map_err(db_err)?;
            Ok(affected > 0)
        })
    }
}

fn row_to_organization(row: &rusqlite::Row<'_>) -> rusqlite::Result<Organization> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at: String = row.get(3)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);

    Ok(Organization {
        id,
        name: row.get(1)?,
        display_name: row.get(2)?,
        created_at: Some(created_at),
    })
}

#[cfg(test)]
mod tests {
    use flightctl_core::StoreError;

    use super::*;

    fn org_store() -> OrganizationStore {
        let store = OrganizationStore::new(Db::open_in_memory().unwrap());
        store.initial_migration().unwrap();
        store
    }

    #[test]
    fn default_organization_is_seeded() {
        let store = org_store();
        let default = store.get(DEFAULT_ORG_ID).unwrap();
        assert_eq!(default.name, "default");

        // Re-running the migration leaves it alone.
        store.initial_migration().unwrap();
        assert_eq!(store.list().unwrap().items.len(), 1);
    }

    #[test]
    fn organization_crud() {
        let store = org_store();
        let org = Organization {
            id: Uuid::new_v4(),
            name: "acme".to_string(),
            display_name: Some("ACME Corp".to_string()),
            created_at: None,
        };

        let created = store.create(&org).unwrap();
        assert!(created.created_at.is_some());

        assert!(matches!(
            store.create(&org),
            Err(StoreError::DuplicateName)
        ));

        let fetched = store.get(org.id).unwrap();
        assert_eq!(fetched.name, "acme");

        assert!(store.delete(org.id).unwrap());
        assert!(!store.delete(org.id).unwrap());
    }
}
