//! The version registry and the pure negotiation function.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// One version an endpoint supports, with an optional deprecation
/// timestamp announced to clients that negotiate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedVersion {
    /// Version string, e.g. `v1beta1`.
    pub version: String,
    /// When this version was (or will be) deprecated for this endpoint.
    pub deprecated_at: Option<DateTime<Utc>>,
}

impl SupportedVersion {
    /// A supported version without a deprecation date.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            deprecated_at: None,
        }
    }

    /// Mark this version as deprecated at the given time.
    #[must_use]
    pub fn deprecated_at(mut self, at: DateTime<Utc>) -> Self {
        self.deprecated_at = Some(at);
        self
    }
}

/// Ordered version metadata for one endpoint; the first entry is the most
/// preferred and is selected for clients that express no preference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointVersions {
    /// Supported versions, most preferred first.
    pub versions: Vec<SupportedVersion>,
}

impl EndpointVersions {
    /// Metadata listing the given versions, most preferred first.
    #[must_use]
    pub fn new(versions: Vec<SupportedVersion>) -> Self {
        Self { versions }
    }
}

/// The version selected for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedVersion {
    /// The negotiated version string.
    pub version: String,
    /// Deprecation timestamp of the negotiated version, when the endpoint
    /// declares one.
    pub deprecated_at: Option<DateTime<Utc>>,
}

/// Negotiation failure: the client asked for a version the endpoint does
/// not serve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("requested API version is not supported")]
pub struct NotAcceptable {
    /// Every version the endpoint supports, for the rejection response.
    pub supported: Vec<String>,
}

/// Per-endpoint version metadata plus the registry-wide fallback version.
///
/// Endpoints without registered metadata have a fixed single-version
/// contract: they serve exactly the fallback version.
pub struct VersionRegistry {
    fallback: String,
    endpoints: Vec<(RoutePattern, EndpointVersions)>,
}

impl VersionRegistry {
    /// A registry with the given fallback version and no endpoint
    /// metadata.
    #[must_use]
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            fallback: fallback.into(),
            endpoints: Vec::new(),
        }
    }

    /// The version served when an endpoint has no metadata.
    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Register version metadata for a route pattern such as
    /// `/api/v1/devices/{name}`.
    pub fn register(&mut self, pattern: &str, versions: EndpointVersions) {
        self.endpoints.push((RoutePattern::parse(pattern), versions));
    }

    /// Version metadata of the first pattern matching the path, if any.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> Option<&EndpointVersions> {
        self.endpoints
            .iter()
            .find(|(pattern, _)| pattern.matches(path))
            .map(|(_, versions)| versions)
    }

    /// Decide which API version applies to a request.
    ///
    /// Without endpoint metadata, only the fallback version (or no
    /// preference at all) is acceptable. With metadata, no preference
    /// selects the first (most preferred) entry and an explicit preference
    /// must appear in the endpoint's list.
    ///
    /// # Errors
    ///
    /// Returns [`NotAcceptable`] carrying the endpoint's full supported
    /// list when the requested version is not served.
    pub fn negotiate(
        &self,
        requested: Option<&str>,
        path: &str,
    ) -> Result<NegotiatedVersion, NotAcceptable> {
        let endpoint = self.endpoint(path).filter(|meta| !meta.versions.is_empty());

        match endpoint {
            None => match requested {
                None => Ok(NegotiatedVersion {
                    version: self.fallback.clone(),
                    deprecated_at: None,
                }),
                Some(version) if version == self.fallback => Ok(NegotiatedVersion {
                    version: self.fallback.clone(),
                    deprecated_at: None,
                }),
                Some(_) => Err(NotAcceptable {
                    supported: vec![self.fallback.clone()],
                }),
            },
            Some(meta) => {
                let selected = match requested {
                    None => meta.versions.first(),
                    Some(version) => meta.versions.iter().find(|v| v.version == version),
                };
                selected.map_or_else(
                    || {
                        Err(NotAcceptable {
                            supported: meta
                                .versions
                                .iter()
                                .map(|v| v.version.clone())
                                .collect(),
                        })
                    },
                    |v| {
                        Ok(NegotiatedVersion {
                            version: v.version.clone(),
                            deprecated_at: v.deprecated_at,
                        })
                    },
                )
            }
        }
    }
}

/// A route pattern matched segment-wise; `{param}` segments match any
/// value.
struct RoutePattern {
    segments: Vec<Segment>,
}

enum Segment {
    Literal(String),
    Param,
}

impl RoutePattern {
    fn parse(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s.starts_with('{') && s.ends_with('}') {
                    Segment::Param
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();
        Self { segments }
    }

    fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        parts.len() == self.segments.len()
            && self
                .segments
                .iter()
                .zip(parts)
                .all(|(segment, part)| match segment {
                    Segment::Literal(literal) => literal == part,
                    Segment::Param => true,
                })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLBACK: &str = "v1beta1";

    fn registry_with(pattern: &str, versions: Vec<SupportedVersion>) -> VersionRegistry {
        let mut registry = VersionRegistry::new(FALLBACK);
        registry.register(pattern, EndpointVersions::new(versions));
        registry
    }

    #[test]
    fn no_header_with_metadata_selects_that_version() {
        let registry = registry_with("/api/v1/devices", vec![SupportedVersion::new("v1beta1")]);
        let negotiated = registry.negotiate(None, "/api/v1/devices").unwrap();
        assert_eq!(negotiated.version, "v1beta1");
    }

    #[test]
    fn unsupported_header_with_metadata_is_rejected() {
        let registry = registry_with("/api/v1/devices", vec![SupportedVersion::new("v1beta1")]);
        let err = registry
            .negotiate(Some("v2"), "/api/v1/devices")
            .unwrap_err();
        assert_eq!(err.supported, vec!["v1beta1".to_string()]);
    }

    #[test]
    fn no_header_without_metadata_selects_fallback() {
        let registry = VersionRegistry::new(FALLBACK);
        let negotiated = registry.negotiate(None, "/api/v1/fleets").unwrap();
        assert_eq!(negotiated.version, FALLBACK);
    }

    #[test]
    fn explicit_fallback_without_metadata_is_accepted() {
        let registry = VersionRegistry::new(FALLBACK);
        let negotiated = registry.negotiate(Some("v1beta1"), "/api/v1/fleets").unwrap();
        assert_eq!(negotiated.version, FALLBACK);
    }

    #[test]
    fn non_fallback_without_metadata_is_rejected() {
        let registry = VersionRegistry::new(FALLBACK);
        let err = registry.negotiate(Some("v2"), "/api/v1/fleets").unwrap_err();
        assert_eq!(err.supported, vec![FALLBACK.to_string()]);
    }

    #[test]
    fn first_listed_version_is_most_preferred() {
        let registry = registry_with(
            "/api/v1/devices",
            vec![SupportedVersion::new("v1"), SupportedVersion::new("v1beta1")],
        );
        let negotiated = registry.negotiate(None, "/api/v1/devices").unwrap();
        assert_eq!(negotiated.version, "v1");
    }

    #[test]
    fn negotiated_version_carries_deprecation() {
        let sunset = DateTime::from_timestamp(1_772_323_200, 0).unwrap();
        let registry = registry_with(
            "/api/v1/devices",
            vec![
                SupportedVersion::new("v1beta1"),
                SupportedVersion::new("v1").deprecated_at(sunset),
            ],
        );
        let negotiated = registry.negotiate(Some("v1"), "/api/v1/devices").unwrap();
        assert_eq!(negotiated.deprecated_at, Some(sunset));

        let negotiated = registry
            .negotiate(Some("v1beta1"), "/api/v1/devices")
            .unwrap();
        assert_eq!(negotiated.deprecated_at, None);
    }

    #[test]
    fn patterns_match_parameter_segments() {
        let registry = registry_with(
            "/api/v1/devices/{name}",
            vec![SupportedVersion::new("v1beta1")],
        );
        assert!(registry.endpoint("/api/v1/devices/dev-1").is_some());
        assert!(registry.endpoint("/api/v1/devices").is_none());
        assert!(registry.endpoint("/api/v1/devices/dev-1/status").is_none());
    }
}
