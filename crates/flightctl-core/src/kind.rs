//! Resource kinds and owner references.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kinds of resources managed by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// A managed edge device.
    Device,
    /// A group of devices sharing a template.
    Fleet,
    /// A device's request to join the service.
    EnrollmentRequest,
    /// A git or artifact repository the service syncs from.
    Repository,
    /// A declarative sync of repository contents into resources.
    ResourceSync,
    /// An immutable snapshot of a fleet's template.
    TemplateVersion,
    /// An external identity provider configuration.
    AuthProvider,
    /// A certificate signing request.
    CertificateSigningRequest,
    /// A catalog of deployable content.
    Catalog,
    /// An audit/event record.
    Event,
    /// A tenant organization.
    Organization,
}

impl Kind {
    /// The canonical kind name as it appears in API payloads and owner
    /// references.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Device => "Device",
            Self::Fleet => "Fleet",
            Self::EnrollmentRequest => "EnrollmentRequest",
            Self::Repository => "Repository",
            Self::ResourceSync => "ResourceSync",
            Self::TemplateVersion => "TemplateVersion",
            Self::AuthProvider => "AuthProvider",
            Self::CertificateSigningRequest => "CertificateSigningRequest",
            Self::Catalog => "Catalog",
            Self::Event => "Event",
            Self::Organization => "Organization",
        }
    }

    /// Format an owner reference (`<Kind>/<name>`) naming a resource of
    /// this kind.
    #[must_use]
    pub fn owner_ref(self, name: &str) -> String {
        format!("{}/{name}", self.as_str())
    }

    /// Split an owner reference into its kind and name.
    ///
    /// Returns `None` if the string is not of the form `<Kind>/<name>` with
    /// a known kind.
    #[must_use]
    pub fn parse_owner_ref(owner: &str) -> Option<(Self, &str)> {
        let (kind, name) = owner.split_once('/')?;
        if name.is_empty() {
            return None;
        }
        Some((kind.parse().ok()?, name))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown kind name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for Kind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Device" => Ok(Self::Device),
            "Fleet" => Ok(Self::Fleet),
            "EnrollmentRequest" => Ok(Self::EnrollmentRequest),
            "Repository" => Ok(Self::Repository),
            "ResourceSync" => Ok(Self::ResourceSync),
            "TemplateVersion" => Ok(Self::TemplateVersion),
            "AuthProvider" => Ok(Self::AuthProvider),
            "CertificateSigningRequest" => Ok(Self::CertificateSigningRequest),
            "Catalog" => Ok(Self::Catalog),
            "Event" => Ok(Self::Event),
            "Organization" => Ok(Self::Organization),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_ref_round_trip() {
        let owner = Kind::ResourceSync.owner_ref("repo-sync");
        assert_eq!(owner, "ResourceSync/repo-sync");

        let (kind, name) = Kind::parse_owner_ref(&owner).unwrap();
        assert_eq!(kind, Kind::ResourceSync);
        assert_eq!(name, "repo-sync");
    }

    #[test]
    fn parse_owner_ref_rejects_malformed() {
        assert!(Kind::parse_owner_ref("Fleet").is_none());
        assert!(Kind::parse_owner_ref("Fleet/").is_none());
        assert!(Kind::parse_owner_ref("Gadget/x").is_none());
    }

    #[test]
    fn kind_serializes_to_its_canonical_name() {
        let json = serde_json::to_value(Kind::EnrollmentRequest).unwrap();
        assert_eq!(json, serde_json::json!("EnrollmentRequest"));
        let parsed: Kind = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, Kind::EnrollmentRequest);
    }

    #[test]
    fn kind_names_parse_back() {
        for kind in [
            Kind::Device,
            Kind::Fleet,
            Kind::EnrollmentRequest,
            Kind::Repository,
            Kind::ResourceSync,
            Kind::TemplateVersion,
            Kind::AuthProvider,
            Kind::CertificateSigningRequest,
            Kind::Catalog,
            Kind::Event,
            Kind::Organization,
        ] {
            assert_eq!(kind.as_str().parse::<Kind>().unwrap(), kind);
        }
    }
}
