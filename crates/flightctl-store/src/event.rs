//! Event store facade.
//!
//! Events are the one kind without a spec column: they are append-only
//! audit records, created once and never updated, listed in creation order
//! and eventually swept by a retention pass.

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter};
use rusqlite::types::Value;
use uuid::Uuid;

use flightctl_api::{Event, EventList, ListMeta, ObjectMeta, ObjectReference};
use flightctl_core::{Result, StoreError};

use crate::db::{db_err, Db};
use crate::list::{Continue, ListParams, SortBy};
use crate::model::fmt_timestamp;

/// Store for [`Event`] resources.
pub struct EventStore {
    db: Db,
}

struct EventRow {
    name: String,
    reason: String,
    event_type: String,
    message: String,
    involved_kind: String,
    involved_name: String,
    created_at: DateTime<Utc>,
}

impl EventStore {
    /// Create the facade over a database handle.
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Create the backing table.
    ///
    /// # Errors
    ///
    /// Returns a database error if the DDL fails.
    pub fn initial_migration(&self) -> Result<()> {
        self.db.with(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS events (\n\
                 \torg_id TEXT NOT NULL,\n\
                 \tname TEXT NOT NULL,\n\
                 \treason TEXT NOT NULL,\n\
                 \tevent_type TEXT NOT NULL,\n\
                 \tmessage TEXT NOT NULL,\n\
                 \tinvolved_kind TEXT NOT NULL,\n\
                 \tinvolved_name TEXT NOT NULL,\n\
                 \tcreated_at TEXT NOT NULL,\n\
                 \tPRIMARY KEY (org_id, name)\n\
                 );\n\
                 CREATE INDEX IF NOT EXISTS idx_events_created_at \
                 ON events (org_id, created_at);",
            )
            .map_err(db_err)
        })
    }

    /// Append an event.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNameIsNil` when the event carries no name and
    /// `DuplicateName` when the name is already taken.
    pub fn create(&self, org_id: Uuid, event: &Event) -> Result<Event> {
        let name = event
            .metadata
            .name
            .clone()
            .ok_or(StoreError::ResourceNameIsNil)?;
        let created_at = event.timestamp.unwrap_or_else(Utc::now);

        self.db.with(|conn| {
            conn.execute(
                "INSERT INTO events (org_id, name, reason, event_type, message, \
                 involved_kind, involved_name, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    org_id.to_string(),
                    name,
                    event.reason,
                    event.event_type,
                    event.message,
                    event.involved_object.kind,
                    event.involved_object.name,
                    fmt_timestamp(created_at),
                ],
            )
            .map_err(db_err)?;
            Ok(())
        })?;

        let mut stored = event.clone();
        stored.timestamp = Some(created_at);
        Ok(stored)
    }

    /// List events in creation order, paginated like every other kind.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails or a serialization error
    /// for a malformed continuation token.
    pub fn list(&self, org_id: Uuid, params: &ListParams) -> Result<EventList> {
        let limit = params.limit;

        let mut sql =
            "SELECT name, reason, event_type, message, involved_kind, involved_name, created_at \
             FROM events WHERE org_id = ?"
                .to_string();
        let mut values = vec![Value::Text(org_id.to_string())];
        if let Some(cont) = &params.cont {
            if cont.values.len() != 2 {
                return Err(StoreError::Serialization(
                    "continue token does not match the list sort order".to_string(),
                ));
            }
            sql.push_str(" AND (created_at > ? OR (created_at = ? AND name >= ?))");
            values.push(Value::Text(cont.values[0].clone()));
            values.push(Value::Text(cont.values[0].clone()));
            values.push(Value::Text(cont.values[1].clone()));
        }
        sql.push_str(" ORDER BY created_at, name");
        if limit > 0 {
            sql.push_str(&format!(" LIMIT {}", limit + 1));
        }

        let mut rows: Vec<EventRow> = self.db.with(|conn| {
            let mut stmt = conn.prepare(&sql).map_err(db_err)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), |row| {
                    let created_at: String = row.get(6)?;
                    let created_at = DateTime::parse_from_rfc3339(&created_at)
                        .map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(
                                6,
                                rusqlite::types::Type::Text,
                                Box::new(e),
                            )
                        })?
                        .with_timezone(&Utc);
                    Ok(EventRow {
                        name: row.get(0)?,
                        reason: row.get(1)?,
                        event_type: row.get(2)?,
                        message: row.get(3)?,
                        involved_kind: row.get(4)?,
                        involved_name: row.get(5)?,
                        created_at,
                    })
                })
                .map_err(db_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
        })?;

        let mut continue_token = None;
        let mut remaining = None;
        if limit > 0 && rows.len() > limit {
            if let Some(boundary) = rows.pop() {
                let boundary_values =
                    vec![fmt_timestamp(boundary.created_at), boundary.name.clone()];
                let count = match &params.cont {
                    Some(cont) => (cont.count - i64::try_from(limit).unwrap_or(i64::MAX)).max(1),
                    None => self.db.with(|conn| {
                        conn.query_row(
                            "SELECT COUNT(*) FROM events WHERE org_id = ?1 \
                             AND (created_at > ?2 OR (created_at = ?2 AND name >= ?3))",
                            params![
                                org_id.to_string(),
                                boundary_values[0],
                                boundary_values[1]
                            ],
                            |row| row.get(0),
                        )
                        .map_err(db_err)
                    })?,
                };
                continue_token = Some(Continue::new(boundary_values, count).encode()?);
                remaining = Some(count);
            }
        }

        let items = rows
            .into_iter()
            .map(|row| Event {
                metadata: ObjectMeta {
                    creation_timestamp: Some(row.created_at),
                    ..ObjectMeta::named(row.name)
                },
                reason: row.reason,
                event_type: row.event_type,
                message: row.message,
                involved_object: ObjectReference {
                    kind: row.involved_kind,
                    name: row.involved_name,
                },
                timestamp: Some(row.created_at),
            })
            .collect();

        Ok(EventList {
            items,
            metadata: ListMeta {
                continue_token,
                remaining_item_count: remaining,
            },
        })
    }

    /// Remove events created before the cutoff. Returns how many were
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails.
    pub fn delete_older_than(&self, org_id: Uuid, cutoff: DateTime<Utc>) -> Result<usize> {
        self.db.with(|conn| {
            conn.execute(
                "DELETE FROM events WHERE org_id = ?1 AND created_at < ?2",
                params![org_id.to_string(), fmt_timestamp(cutoff)],
            )
            .map_err(db_err)
        })
    }

    /// Events always sort by creation time; callers supply [`ListParams`]
    /// built with this sort order.
    #[must_use]
    pub fn list_params(limit: usize, cont: Option<Continue>) -> ListParams {
        ListParams {
            limit,
            cont,
            sort_by: SortBy::CreatedAt,
            ..ListParams::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn event_store() -> EventStore {
        let store = EventStore::new(Db::open_in_memory().unwrap());
        store.initial_migration().unwrap();
        store
    }

    fn event(name: &str, at: DateTime<Utc>) -> Event {
        Event {
            metadata: ObjectMeta::named(name),
            reason: "ResourceCreated".to_string(),
            event_type: "Normal".to_string(),
            message: "created".to_string(),
            involved_object: ObjectReference {
                kind: "Device".to_string(),
                name: "dev-1".to_string(),
            },
            timestamp: Some(at),
        }
    }

    #[test]
    fn events_list_in_creation_order() {
        let store = event_store();
        let org = Uuid::nil();
        let base = Utc::now();

        store.create(org, &event("e-later", base + Duration::seconds(2))).unwrap();
        store.create(org, &event("e-early", base)).unwrap();

        let list = store.list(org, &EventStore::list_params(0, None)).unwrap();
        let names: Vec<_> = list
            .items
            .iter()
            .map(|e| e.metadata.name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["e-early", "e-later"]);
    }

    #[test]
    fn event_pagination_walks_the_full_set() {
        let store = event_store();
        let org = Uuid::nil();
        let base = Utc::now();
        for i in 0..5 {
            store
                .create(org, &event(&format!("e-{i}"), base + Duration::seconds(i)))
                .unwrap();
        }

        let mut seen = Vec::new();
        let mut cont = None;
        loop {
            let list = store
                .list(org, &EventStore::list_params(2, cont.take()))
                .unwrap();
            seen.extend(
                list.items
                    .iter()
                    .map(|e| e.metadata.name.clone().unwrap()),
            );
            match list.metadata.continue_token {
                Some(token) => cont = Some(Continue::decode(&token).unwrap()),
                None => break,
            }
        }
        assert_eq!(seen, vec!["e-0", "e-1", "e-2", "e-3", "e-4"]);
    }

    #[test]
    fn retention_sweep_removes_old_events() {
        let store = event_store();
        let org = Uuid::nil();
        let base = Utc::now();

        store.create(org, &event("old", base - Duration::days(30))).unwrap();
        store.create(org, &event("new", base)).unwrap();

        let removed = store
            .delete_older_than(org, base - Duration::days(7))
            .unwrap();
        assert_eq!(removed, 1);

        let list = store.list(org, &EventStore::list_params(0, None)).unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].metadata.name.as_deref(), Some("new"));
    }
}
