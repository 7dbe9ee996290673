//! Extractors and helpers shared by all resource handlers.

use std::collections::BTreeMap;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderName;
use serde::Deserialize;
use uuid::Uuid;

use flightctl_api::ObjectMeta;
use flightctl_store::{Continue, ListParams, DEFAULT_ORG_ID};

use crate::error::ApiError;

/// Header selecting the organization a request acts in. Requests without
/// it fall into the default organization.
pub const ORG_ID_HEADER: HeaderName = HeaderName::from_static("flightctl-org-id");

/// The organization scope of a request.
#[derive(Debug, Clone, Copy)]
pub struct OrgId(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for OrgId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.headers.get(&ORG_ID_HEADER) {
            None => Ok(Self(DEFAULT_ORG_ID)),
            Some(value) => {
                let value = value
                    .to_str()
                    .map_err(|_| ApiError::BadRequest("invalid organization id".to_string()))?;
                Uuid::parse_str(value.trim()).map(Self).map_err(|_| {
                    ApiError::BadRequest(format!("invalid organization id: {value}"))
                })
            }
        }
    }
}

/// Query parameters of list endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Page size.
    pub limit: Option<usize>,
    /// Continuation token from a previous page.
    #[serde(rename = "continue")]
    pub continue_token: Option<String>,
    /// Comma-joined `key=value` equality pairs.
    pub label_selector: Option<String>,
    /// Owner reference filter.
    pub owner: Option<String>,
}

impl ListQuery {
    /// Convert wire query parameters into store list parameters.
    ///
    /// # Errors
    ///
    /// Returns a bad-request error for malformed tokens or selectors.
    pub fn into_list_params(self) -> Result<ListParams, ApiError> {
        let cont = self
            .continue_token
            .as_deref()
            .map(Continue::decode)
            .transpose()
            .map_err(|_| ApiError::BadRequest("invalid continue token".to_string()))?;

        let mut labels = BTreeMap::new();
        if let Some(selector) = self.label_selector.as_deref() {
            for pair in selector.split(',').filter(|p| !p.is_empty()) {
                let (key, value) = pair.split_once('=').ok_or_else(|| {
                    ApiError::BadRequest(format!("invalid label selector term: {pair}"))
                })?;
                labels.insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        Ok(ListParams {
            limit: self.limit.unwrap_or(0),
            cont,
            labels,
            owners: self.owner.into_iter().collect(),
            ..ListParams::default()
        })
    }
}

/// Make the body's metadata name agree with the path.
///
/// An absent body name is filled in from the path; a conflicting one is
/// rejected.
pub fn reconcile_name(metadata: &mut ObjectMeta, path_name: &str) -> Result<(), ApiError> {
    match metadata.name.as_deref() {
        None => {
            metadata.name = Some(path_name.to_string());
            Ok(())
        }
        Some(name) if name == path_name => Ok(()),
        Some(name) => Err(ApiError::BadRequest(format!(
            "resource name {name} does not match path name {path_name}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_selector_parses_equality_pairs() {
        let query = ListQuery {
            label_selector: Some("site=berlin, tier=prod".to_string()),
            ..ListQuery::default()
        };
        let params = query.into_list_params().unwrap();
        assert_eq!(params.labels.get("site").unwrap(), "berlin");
        assert_eq!(params.labels.get("tier").unwrap(), "prod");
    }

    #[test]
    fn malformed_selector_is_rejected() {
        let query = ListQuery {
            label_selector: Some("siteberlin".to_string()),
            ..ListQuery::default()
        };
        assert!(query.into_list_params().is_err());
    }

    #[test]
    fn malformed_continue_token_is_rejected() {
        let query = ListQuery {
            continue_token: Some("@@@".to_string()),
            ..ListQuery::default()
        };
        assert!(query.into_list_params().is_err());
    }

    #[test]
    fn name_reconciliation() {
        let mut meta = ObjectMeta::default();
        reconcile_name(&mut meta, "dev-1").unwrap();
        assert_eq!(meta.name.as_deref(), Some("dev-1"));

        reconcile_name(&mut meta, "dev-1").unwrap();
        assert!(reconcile_name(&mut meta, "dev-2").is_err());
    }
}
