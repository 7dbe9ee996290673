//! List parameters, continuation tokens and query building.
//!
//! List queries fetch one row more than the requested limit; when the extra
//! row comes back it is trimmed off and its sort-column values become the
//! continuation boundary. Resuming with the token applies a `>=` predicate
//! on those values, so the trimmed row is the first row of the next page
//! and, over a stable dataset, no row is duplicated or skipped.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use flightctl_core::{Result, StoreError};

use crate::model::{fmt_timestamp, RecordMeta};

/// Version tag embedded in continuation tokens so their internal shape can
/// evolve without breaking clients holding older tokens.
pub const CURRENT_CONTINUE_VERSION: u32 = 1;

/// Decoded continuation token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continue {
    /// Token format version.
    pub version: u32,
    /// Sort-column values of the boundary row.
    pub values: Vec<String>,
    /// Estimated items remaining at the boundary, including the boundary
    /// row itself.
    pub count: i64,
}

impl Continue {
    pub(crate) fn new(values: Vec<String>, count: i64) -> Self {
        Self {
            version: CURRENT_CONTINUE_VERSION,
            values,
            count,
        }
    }

    /// Encode into the opaque wire form.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the token cannot be encoded.
    pub fn encode(&self) -> Result<String> {
        let bytes =
            serde_json::to_vec(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(BASE64.encode(bytes))
    }

    /// Decode from the opaque wire form, rejecting unknown format versions.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the token is malformed or carries
    /// an unsupported version tag.
    pub fn decode(token: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(token)
            .map_err(|e| StoreError::Serialization(format!("invalid continue token: {e}")))?;
        let parsed: Self = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Serialization(format!("invalid continue token: {e}")))?;
        if parsed.version != CURRENT_CONTINUE_VERSION {
            return Err(StoreError::Serialization(format!(
                "unsupported continue token version: {}",
                parsed.version
            )));
        }
        Ok(parsed)
    }
}

/// Sort order of a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Order by name.
    #[default]
    Name,
    /// Order by creation time, name as tie-breaker.
    CreatedAt,
}

impl SortBy {
    pub(crate) const fn order_clause(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::CreatedAt => "created_at, name",
        }
    }

    /// Number of sort-column values a continuation token must carry.
    pub(crate) const fn value_count(self) -> usize {
        match self {
            Self::Name => 1,
            Self::CreatedAt => 2,
        }
    }
}

/// Filtering, ordering and pagination parameters for a list query.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    /// Page size; `0` disables pagination.
    pub limit: usize,
    /// Continuation token from a previous page.
    pub cont: Option<Continue>,
    /// Equality label selector; every pair must match.
    pub labels: BTreeMap<String, String>,
    /// Restrict to resources with one of these owner references.
    pub owners: Vec<String>,
    /// Sort order.
    pub sort_by: SortBy,
}

impl ListParams {
    /// Parameters selecting up to `limit` items.
    #[must_use]
    pub fn limited(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }
}

/// Build the paged SELECT for a resource table.
///
/// `fetch` carries the limit+1 row count when pagination is on.
pub(crate) fn build_select(
    table: &str,
    select_columns: &str,
    org_id: Uuid,
    params: &ListParams,
    fetch: Option<usize>,
) -> Result<(String, Vec<Value>)> {
    let mut sql = format!(
        "SELECT {select_columns} FROM {table} WHERE org_id = ? AND spec IS NOT NULL"
    );
    let mut values = vec![Value::Text(org_id.to_string())];

    push_filters(&mut sql, &mut values, params);
    if let Some(cont) = &params.cont {
        push_boundary(&mut sql, &mut values, params.sort_by, &cont.values)?;
    }

    let _ = write!(sql, " ORDER BY {}", params.sort_by.order_clause());
    if let Some(n) = fetch {
        let _ = write!(sql, " LIMIT {n}");
    }
    Ok((sql, values))
}

/// Build the COUNT query with the same filters, optionally restricted to
/// rows at or past a continuation boundary.
pub(crate) fn build_count(
    table: &str,
    org_id: Uuid,
    params: &ListParams,
    boundary: Option<&[String]>,
) -> Result<(String, Vec<Value>)> {
    let mut sql = format!("SELECT COUNT(*) FROM {table} WHERE org_id = ? AND spec IS NOT NULL");
    let mut values = vec![Value::Text(org_id.to_string())];

    push_filters(&mut sql, &mut values, params);
    if let Some(boundary) = boundary {
        push_boundary(&mut sql, &mut values, params.sort_by, boundary)?;
    }
    Ok((sql, values))
}

/// The sort-column values identifying a boundary row.
pub(crate) fn continue_values(meta: &RecordMeta, sort_by: SortBy) -> Vec<String> {
    match sort_by {
        SortBy::Name => vec![meta.name.clone()],
        SortBy::CreatedAt => vec![fmt_timestamp(meta.created_at), meta.name.clone()],
    }
}

fn push_filters(sql: &mut String, values: &mut Vec<Value>, params: &ListParams) {
    for (key, value) in &params.labels {
        sql.push_str(" AND json_extract(labels, ?) = ?");
        values.push(Value::Text(format!("$.\"{key}\"")));
        values.push(Value::Text(value.clone()));
    }
    if !params.owners.is_empty() {
        sql.push_str(" AND owner IN (");
        for (i, owner) in params.owners.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
            values.push(Value::Text(owner.clone()));
        }
        sql.push(')');
    }
}

fn push_boundary(
    sql: &mut String,
    values: &mut Vec<Value>,
    sort_by: SortBy,
    boundary: &[String],
) -> Result<()> {
    if boundary.len() != sort_by.value_count() {
        return Err(StoreError::Serialization(
            "continue token does not match the list sort order".to_string(),
        ));
    }
    match sort_by {
        SortBy::Name => {
            sql.push_str(" AND name >= ?");
            values.push(Value::Text(boundary[0].clone()));
        }
        SortBy::CreatedAt => {
            sql.push_str(" AND (created_at > ? OR (created_at = ? AND name >= ?))");
            values.push(Value::Text(boundary[0].clone()));
            values.push(Value::Text(boundary[0].clone()));
            values.push(Value::Text(boundary[1].clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continue_token_round_trips() {
        let token = Continue::new(vec!["device-0042".to_string()], 17);
        let encoded = token.encode().unwrap();
        assert_eq!(Continue::decode(&encoded).unwrap(), token);
    }

    #[test]
    fn continue_token_rejects_unknown_version() {
        let token = Continue {
            version: 99,
            values: vec!["x".to_string()],
            count: 1,
        };
        let encoded = BASE64.encode(serde_json::to_vec(&token).unwrap());
        assert!(Continue::decode(&encoded).is_err());
    }

    #[test]
    fn continue_token_rejects_garbage() {
        assert!(Continue::decode("not base64!").is_err());
        assert!(Continue::decode(&BASE64.encode(b"not json")).is_err());
    }

    #[test]
    fn select_includes_filters_and_boundary() {
        let mut params = ListParams::limited(10);
        params.labels.insert("site".to_string(), "berlin".to_string());
        params.owners.push("Fleet/edge".to_string());
        params.cont = Some(Continue::new(vec!["m".to_string()], 5));

        let (sql, values) =
            build_select("devices", "name", Uuid::nil(), &params, Some(11)).unwrap();
        assert!(sql.contains("json_extract(labels, ?) = ?"));
        assert!(sql.contains("owner IN (?)"));
        assert!(sql.contains("name >= ?"));
        assert!(sql.ends_with("ORDER BY name LIMIT 11"));
        assert_eq!(values.len(), 5);
    }

    #[test]
    fn boundary_must_match_sort_order() {
        let mut params = ListParams::limited(10);
        params.sort_by = SortBy::CreatedAt;
        params.cont = Some(Continue::new(vec!["only-one".to_string()], 5));

        let result = build_select("devices", "name", Uuid::nil(), &params, Some(11));
        assert!(result.is_err());
    }
}
