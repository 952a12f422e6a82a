//! Pure host-name composition
//!
//! Every endpoint of a deployment derives from one base host such as
//! `ns1.cluster.dev.example.com`:
//!
//! | kind                       | example                                    |
//! |----------------------------|--------------------------------------------|
//! | admin / manager / consumer | `https://manager.ns1.cluster.dev.example.com` |
//! | analyticsEndpoint          | `https://ai.ns1.cluster.dev.example.com`      |
//! | portalEndpoint             | `https://api.portal.ns1.cluster.dev.example.com` |
//! | v5GatewayEndpoint          | `https://ns1-gwd.cluster.dev.example.com`     |
//! | v6GatewayEndpointBase      | `https://ns1-rgw.cluster.dev.example.com`     |

use apiseed_domain::{HostKind, HostSet};
use once_cell::sync::Lazy;
use regex::Regex;

static SCHEME_AND_APP_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"http.?://(manager\.|admin\.|consumer\.)?")
        .expect("SCHEME_AND_APP_LABEL should compile - this is a bug")
});

/// Gateway generation, which picks the host infix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayVersion {
    V5,
    V6,
}

impl GatewayVersion {
    fn infix(self, base: bool) -> &'static str {
        match (self, base) {
            (Self::V5, false) => "gwd",
            (Self::V5, true) => "gw",
            (Self::V6, false) => "rgwd",
            (Self::V6, true) => "rgw",
        }
    }
}

/// `http://` or `https://`.
pub fn protocol(use_http: bool) -> &'static str {
    if use_http {
        "http://"
    } else {
        "https://"
    }
}

/// Strip the scheme and a leading `manager.`, `admin.` or `consumer.` label.
pub fn strip_api_host(raw: &str) -> String {
    SCHEME_AND_APP_LABEL.replace(raw, "").into_owned()
}

/// `<namespace>.<cluster>.<domain>`
pub fn cluster_host(namespace: &str, cluster: &str, domain: &str) -> String {
    format!("{namespace}.{cluster}.{domain}")
}

/// Admin, manager and consumer URLs, with or without the app label.
pub fn app_hosts(protocol: &str, host: &str, prefixed: bool) -> [String; 3] {
    ["admin", "manager", "consumer"].map(|label| {
        if prefixed {
            format!("{protocol}{label}.{host}")
        } else {
            format!("{protocol}{host}")
        }
    })
}

/// Gateway endpoint (`base == false`) or gateway base endpoint.
///
/// The first label is suffixed with the infix (`ns1-gwd.cluster...`), except
/// on lab hosts whose remaining labels equal `lab_suffix`, where the infix
/// becomes a new leading label (`gwd.my-stack.lab.example.com`).
pub fn gateway_endpoint(
    protocol: &str,
    host: &str,
    version: GatewayVersion,
    base: bool,
    lab_suffix: &str,
) -> String {
    let infix = version.infix(base);
    let (first, rest) = host.split_once('.').unwrap_or((host, ""));
    let postfix = format!(".{rest}");

    if postfix == lab_suffix {
        return format!("{protocol}{infix}.{host}");
    }

    format!("{protocol}{first}-{infix}{postfix}")
}

/// Every endpoint for `host`. `prefixed` decides the shape of the three app
/// hosts.
pub fn host_set(protocol: &str, host: &str, prefixed: bool, lab_suffix: &str) -> HostSet {
    let domain = host.rsplit('/').next().unwrap_or(host);
    let [admin, manager, consumer] = app_hosts(protocol, host, prefixed);
    let gateway = |version, base| gateway_endpoint(protocol, host, version, base, lab_suffix);

    let mut hosts = HostSet::default();
    hosts.set(HostKind::Admin, admin);
    hosts.set(HostKind::Manager, manager);
    hosts.set(HostKind::Consumer, consumer);
    hosts.set(HostKind::AnalyticsEndpoint, format!("{protocol}ai.{domain}"));
    hosts.set(HostKind::PortalEndpoint, format!("{protocol}api.portal.{domain}"));
    hosts.set(HostKind::PortalEndpointBase, format!("{protocol}portal.{domain}"));
    hosts.set(HostKind::CustomPortalEndpointBase, format!("{protocol}custom-portal.{domain}"));
    hosts.set(HostKind::V5GatewayEndpoint, gateway(GatewayVersion::V5, false));
    hosts.set(HostKind::V5GatewayEndpointBase, gateway(GatewayVersion::V5, true));
    hosts.set(HostKind::V6GatewayEndpoint, gateway(GatewayVersion::V6, false));
    hosts.set(HostKind::V6GatewayEndpointBase, gateway(GatewayVersion::V6, true));
    hosts
}
