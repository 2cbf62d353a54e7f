//! Database models for providers and the operations each provider kind supports.

use crate::types::ProviderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The flavour of external management system behind a provider row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Openstack,
    Amazon,
    Azure,
    Vmware,
}

/// Result of asking a provider kind whether it supports an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub available: bool,
    pub message: Option<String>,
}

impl Capability {
    fn supported() -> Self {
        Self {
            available: true,
            message: None,
        }
    }

    fn unsupported(operation: &str, kind: ProviderKind) -> Self {
        Self {
            available: false,
            message: Some(format!("{operation} operation not supported for {}", kind.display_name())),
        }
    }
}

impl ProviderKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "openstack" => Some(ProviderKind::Openstack),
            "amazon" => Some(ProviderKind::Amazon),
            "azure" => Some(ProviderKind::Azure),
            "vmware" => Some(ProviderKind::Vmware),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::Openstack => "OpenStack",
            ProviderKind::Amazon => "Amazon EC2",
            ProviderKind::Azure => "Azure",
            ProviderKind::Vmware => "VMware vCenter",
        }
    }

    pub fn supports_create_key_pair(self) -> Capability {
        match self {
            ProviderKind::Openstack | ProviderKind::Amazon => Capability::supported(),
            ProviderKind::Azure | ProviderKind::Vmware => Capability::unsupported("Create KeyPair", self),
        }
    }

    pub fn supports_delete_key_pair(self) -> Capability {
        match self {
            ProviderKind::Openstack | ProviderKind::Amazon => Capability::supported(),
            ProviderKind::Azure | ProviderKind::Vmware => Capability::unsupported("Delete KeyPair", self),
        }
    }

    pub fn supports_delete_cloud_volume(self) -> Capability {
        match self {
            ProviderKind::Openstack | ProviderKind::Amazon | ProviderKind::Azure => Capability::supported(),
            ProviderKind::Vmware => Capability::unsupported("Delete Cloud Volume", self),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ProviderDBResponse {
    pub id: ProviderId,
    pub name: String,
    pub kind: String,
    pub created_on: DateTime<Utc>,
}

impl ProviderDBResponse {
    /// The CHECK constraint on `providers.kind` keeps this `Some` for stored rows.
    pub fn kind(&self) -> Option<ProviderKind> {
        ProviderKind::parse(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloud_kinds_support_key_pairs() {
        assert!(ProviderKind::Openstack.supports_create_key_pair().available);
        assert!(ProviderKind::Amazon.supports_delete_key_pair().available);
    }

    #[test]
    fn test_unsupported_capability_carries_message() {
        let capability = ProviderKind::Vmware.supports_create_key_pair();
        assert!(!capability.available);
        assert_eq!(
            capability.message.as_deref(),
            Some("Create KeyPair operation not supported for VMware vCenter")
        );
    }

    #[test]
    fn test_parse_round_trips_serde_names() {
        for kind in [ProviderKind::Openstack, ProviderKind::Amazon, ProviderKind::Azure, ProviderKind::Vmware] {
            let name = serde_json::to_value(kind).unwrap();
            assert_eq!(ProviderKind::parse(name.as_str().unwrap()), Some(kind));
        }
        assert_eq!(ProviderKind::parse("kubernetes"), None);
    }
}
