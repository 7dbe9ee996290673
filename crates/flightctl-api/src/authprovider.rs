//! Auth provider resource types.

use serde::{Deserialize, Serialize};

use crate::meta::{Condition, ListMeta, ObjectMeta};

/// An external identity provider configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthProvider {
    /// Common resource metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Desired state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<AuthProviderSpec>,
    /// Observed state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AuthProviderStatus>,
}

/// Desired state of an auth provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthProviderSpec {
    /// Provider protocol, e.g. `oidc` or `oauth2`.
    pub provider_type: String,
    /// Issuer URL.
    pub issuer_url: String,
    /// OAuth client identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// Observed state of an auth provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthProviderStatus {
    /// Conditions reported for the provider.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// A page of auth providers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthProviderList {
    /// Auth providers in this page.
    pub items: Vec<AuthProvider>,
    /// Pagination metadata.
    #[serde(default)]
    pub metadata: ListMeta,
}
