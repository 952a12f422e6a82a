//! Roles, host kinds and resolved host sets

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SeedError;

// ============================================================================
// Application roles
// ============================================================================

/// One of the three independently authenticated backend applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppRole {
    Admin,
    Manager,
    Consumer,
}

impl AppRole {
    pub const ALL: [AppRole; 3] = [AppRole::Admin, AppRole::Manager, AppRole::Consumer];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Consumer => "consumer",
        }
    }

    /// Storage key holding the bearer token for this role.
    pub fn token_key(self) -> String {
        format!("token:{}", self.as_str())
    }

    /// Storage key holding the consumer context bound to this role's session.
    pub fn context_key(self) -> String {
        format!("context:{}", self.as_str())
    }

    /// Identity-provider scope used when building a sign-in realm.
    pub fn idp_scope(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "provider",
            Self::Consumer => "consumer",
        }
    }
}

impl fmt::Display for AppRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppRole {
    type Err = SeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|role| role.as_str() == s).ok_or_else(|| {
            SeedError::InvalidInput(format!(
                "app must be one of [admin, manager, consumer], got {s}"
            ))
        })
    }
}

// ============================================================================
// Host kinds
// ============================================================================

/// Every endpoint the resolver knows how to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HostKind {
    Admin,
    Manager,
    Consumer,
    AnalyticsEndpoint,
    PortalEndpoint,
    PortalEndpointBase,
    CustomPortalEndpointBase,
    V5GatewayEndpoint,
    V5GatewayEndpointBase,
    V6GatewayEndpoint,
    V6GatewayEndpointBase,
}

impl HostKind {
    pub const ALL: [HostKind; 11] = [
        HostKind::Admin,
        HostKind::Manager,
        HostKind::Consumer,
        HostKind::AnalyticsEndpoint,
        HostKind::PortalEndpoint,
        HostKind::PortalEndpointBase,
        HostKind::CustomPortalEndpointBase,
        HostKind::V5GatewayEndpoint,
        HostKind::V5GatewayEndpointBase,
        HostKind::V6GatewayEndpoint,
        HostKind::V6GatewayEndpointBase,
    ];

    /// Option / wire name of the kind (also the per-kind override option).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Consumer => "consumer",
            Self::AnalyticsEndpoint => "analyticsEndpoint",
            Self::PortalEndpoint => "portalEndpoint",
            Self::PortalEndpointBase => "portalEndpointBase",
            Self::CustomPortalEndpointBase => "customPortalEndpointBase",
            Self::V5GatewayEndpoint => "v5GatewayEndpoint",
            Self::V5GatewayEndpointBase => "v5GatewayEndpointBase",
            Self::V6GatewayEndpoint => "v6GatewayEndpoint",
            Self::V6GatewayEndpointBase => "v6GatewayEndpointBase",
        }
    }

    /// Comma separated list of every kind, used in configuration errors.
    pub fn names() -> String {
        Self::ALL.iter().map(|kind| kind.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl From<AppRole> for HostKind {
    fn from(role: AppRole) -> Self {
        match role {
            AppRole::Admin => Self::Admin,
            AppRole::Manager => Self::Manager,
            AppRole::Consumer => Self::Consumer,
        }
    }
}

impl fmt::Display for HostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostKind {
    type Err = SeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s).ok_or_else(|| {
            SeedError::InvalidInput(format!("type must be one of [{}, all], got {s}", Self::names()))
        })
    }
}

/// What a caller asks the resolver for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostTarget {
    Kind(HostKind),
    All,
}

impl From<HostKind> for HostTarget {
    fn from(kind: HostKind) -> Self {
        Self::Kind(kind)
    }
}

impl FromStr for HostTarget {
    type Err = SeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Self::All);
        }
        s.parse().map(Self::Kind)
    }
}

/// Fully resolved endpoint URLs, one per [`HostKind`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSet {
    pub admin: String,
    pub manager: String,
    pub consumer: String,
    pub analytics_endpoint: String,
    pub portal_endpoint: String,
    pub portal_endpoint_base: String,
    pub custom_portal_endpoint_base: String,
    pub v5_gateway_endpoint: String,
    pub v5_gateway_endpoint_base: String,
    pub v6_gateway_endpoint: String,
    pub v6_gateway_endpoint_base: String,
}

impl HostSet {
    pub fn get(&self, kind: HostKind) -> &str {
        match kind {
            HostKind::Admin => &self.admin,
            HostKind::Manager => &self.manager,
            HostKind::Consumer => &self.consumer,
            HostKind::AnalyticsEndpoint => &self.analytics_endpoint,
            HostKind::PortalEndpoint => &self.portal_endpoint,
            HostKind::PortalEndpointBase => &self.portal_endpoint_base,
            HostKind::CustomPortalEndpointBase => &self.custom_portal_endpoint_base,
            HostKind::V5GatewayEndpoint => &self.v5_gateway_endpoint,
            HostKind::V5GatewayEndpointBase => &self.v5_gateway_endpoint_base,
            HostKind::V6GatewayEndpoint => &self.v6_gateway_endpoint,
            HostKind::V6GatewayEndpointBase => &self.v6_gateway_endpoint_base,
        }
    }

    pub fn set(&mut self, kind: HostKind, value: String) {
        let slot = match kind {
            HostKind::Admin => &mut self.admin,
            HostKind::Manager => &mut self.manager,
            HostKind::Consumer => &mut self.consumer,
            HostKind::AnalyticsEndpoint => &mut self.analytics_endpoint,
            HostKind::PortalEndpoint => &mut self.portal_endpoint,
            HostKind::PortalEndpointBase => &mut self.portal_endpoint_base,
            HostKind::CustomPortalEndpointBase => &mut self.custom_portal_endpoint_base,
            HostKind::V5GatewayEndpoint => &mut self.v5_gateway_endpoint,
            HostKind::V5GatewayEndpointBase => &mut self.v5_gateway_endpoint_base,
            HostKind::V6GatewayEndpoint => &mut self.v6_gateway_endpoint,
            HostKind::V6GatewayEndpointBase => &mut self.v6_gateway_endpoint_base,
        };
        *slot = value;
    }
}

/// Answer to a [`HostTarget`] query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResolvedHost {
    Single(String),
    All(HostSet),
}

impl ResolvedHost {
    pub fn into_single(self) -> Option<String> {
        match self {
            Self::Single(host) => Some(host),
            Self::All(_) => None,
        }
    }

    pub fn into_all(self) -> Option<HostSet> {
        match self {
            Self::All(hosts) => Some(hosts),
            Self::Single(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_rejects_unknown_apps() {
        assert_eq!("manager".parse::<AppRole>().unwrap(), AppRole::Manager);
        let err = "portal".parse::<AppRole>().unwrap_err();
        assert!(matches!(err, SeedError::InvalidInput(msg) if msg.contains("got portal")));
    }

    #[test]
    fn test_role_scopes_and_token_keys() {
        assert_eq!(AppRole::Manager.idp_scope(), "provider");
        assert_eq!(AppRole::Admin.token_key(), "token:admin");
        assert_eq!(AppRole::Consumer.context_key(), "context:consumer");
    }

    #[test]
    fn test_host_kind_names_match_option_names() {
        for kind in HostKind::ALL {
            assert_eq!(kind.as_str().parse::<HostKind>().unwrap(), kind);
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
        }
        assert!(HostKind::names().starts_with("admin, manager, consumer, analyticsEndpoint"));
    }

    #[test]
    fn test_host_target_accepts_all() {
        assert_eq!("all".parse::<HostTarget>().unwrap(), HostTarget::All);
        assert_eq!(
            "v6GatewayEndpoint".parse::<HostTarget>().unwrap(),
            HostTarget::Kind(HostKind::V6GatewayEndpoint)
        );
        assert!("gateway".parse::<HostTarget>().is_err());
    }

    #[test]
    fn test_host_set_get_and_set_cover_every_kind() {
        let mut hosts = HostSet::default();
        for kind in HostKind::ALL {
            hosts.set(kind, format!("https://{kind}.example.com"));
        }
        for kind in HostKind::ALL {
            assert_eq!(hosts.get(kind), format!("https://{kind}.example.com"));
        }
    }
}
