//! Memoized host resolution
//!
//! The base host comes from the `baseHost` option (host-options mode) or from
//! the [`HostSource`] (`API_HOST`, or cluster + namespace). From it the
//! resolver probes `manager.<host>` to decide whether app hosts carry an app
//! label, confirms the chosen manager host answers, and derives every other
//! endpoint. The result is cached per base host.

use std::sync::Arc;
use std::time::Duration;

use apiseed_domain::constants::PROBE_PATH;
use apiseed_domain::{
    option_names, ClientSettings, HostKind, HostSet, HostSource, HostTarget, OptionsProvider,
    ResolvedHost, Result, SeedError,
};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use super::compose;
use crate::http::{HttpClient, ProbeRequest};

/// Decides whether a host is a live API endpoint.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// `true` when `host` (scheme included) answers the probe.
    async fn is_reachable(&self, host: &str) -> bool;
}

/// Probes `<host>/api/me` and treats an HTTP 401 as a live API host.
#[derive(Clone)]
pub struct HttpProbe {
    client: HttpClient,
    path: String,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(client: HttpClient, timeout: Duration) -> Self {
        Self { client, path: PROBE_PATH.to_string(), timeout }
    }
}

#[async_trait]
impl ReachabilityProbe for HttpProbe {
    async fn is_reachable(&self, host: &str) -> bool {
        let url = format!("{host}{}", self.path);
        debug!(url = %url, timeout_ms = self.timeout.as_millis() as u64, "Probing host");

        match self.client.send(ProbeRequest::get(url).timeout(self.timeout)).await {
            Ok(response) => response.status == 401,
            Err(err) => {
                debug!(host, error = %err, "Probe failed");
                false
            }
        }
    }
}

#[derive(Debug, Clone)]
struct ComputedHosts {
    base_host: String,
    hosts: HostSet,
}

/// Resolves endpoint URLs for every [`HostKind`], probing at most once per
/// base host.
pub struct HostResolver {
    options: Arc<dyn OptionsProvider>,
    source: HostSource,
    settings: ClientSettings,
    probe: Arc<dyn ReachabilityProbe>,
    computed: Mutex<Option<ComputedHosts>>,
}

impl HostResolver {
    pub fn new(
        options: Arc<dyn OptionsProvider>,
        source: HostSource,
        settings: ClientSettings,
        probe: Arc<dyn ReachabilityProbe>,
    ) -> Self {
        Self { options, source, settings, probe, computed: Mutex::new(None) }
    }

    /// Resolver probing over HTTP with the settings' probe timeout.
    pub fn with_http_probe(
        options: Arc<dyn OptionsProvider>,
        source: HostSource,
        settings: ClientSettings,
        client: HttpClient,
    ) -> Self {
        let probe = Arc::new(HttpProbe::new(client, settings.probe_timeout));
        Self::new(options, source, settings, probe)
    }

    /// Resolve one host kind, or every kind.
    ///
    /// `reset` drops previously computed hosts before resolving.
    ///
    /// # Errors
    /// - `SeedError::Config` when no base host can be determined
    /// - `SeedError::Network` when the manager host does not answer
    #[instrument(skip(self))]
    pub async fn get_host(&self, target: HostTarget, reset: bool) -> Result<ResolvedHost> {
        if reset {
            debug!("Clearing computed hosts");
            *self.computed.lock().await = None;
        }

        match target {
            HostTarget::Kind(kind) => self.resolve_kind(kind).await.map(ResolvedHost::Single),
            HostTarget::All => {
                let mut hosts = HostSet::default();
                for kind in HostKind::ALL {
                    hosts.set(kind, self.resolve_kind(kind).await?);
                }
                Ok(ResolvedHost::All(hosts))
            }
        }
    }

    /// Shorthand for a single kind without reset.
    pub async fn host(&self, kind: HostKind) -> Result<String> {
        self.resolve_kind(kind).await
    }

    async fn resolve_kind(&self, kind: HostKind) -> Result<String> {
        if self.options.flag(option_names::USE_HOST_OPTIONS) {
            if let Some(host) = self.options.text(kind.as_str()) {
                return Ok(host);
            }
        }

        let hosts = self.compute_hosts().await?;
        Ok(hosts.get(kind).to_string())
    }

    async fn compute_hosts(&self) -> Result<HostSet> {
        let base_host = self.base_host()?;
        let protocol = compose::protocol(self.options.flag(option_names::HTTP));

        // held across the probes so concurrent callers share one round
        let mut computed = self.computed.lock().await;
        if let Some(cached) = computed.as_ref().filter(|c| c.base_host == base_host) {
            return Ok(cached.hosts.clone());
        }

        info!("Computing hosts for {base_host}");
        let prefixed = self.probe.is_reachable(&format!("{protocol}manager.{base_host}")).await;
        let hosts = compose::host_set(
            protocol,
            &base_host,
            prefixed,
            &self.settings.lab_domain_suffix,
        );

        if !self.probe.is_reachable(&hosts.manager).await {
            return Err(SeedError::Network(format!("API host {base_host} is unreachable")));
        }

        debug!(base_host = %base_host, prefixed, "Hosts computed");
        *computed = Some(ComputedHosts { base_host, hosts: hosts.clone() });
        Ok(hosts)
    }

    fn base_host(&self) -> Result<String> {
        if self.options.flag(option_names::USE_HOST_OPTIONS) {
            let base = self.options.text(option_names::BASE_HOST).ok_or_else(|| {
                SeedError::Config(format!(
                    "You must provide all required hosts ({}) in options or provide the option \
                     baseHost to have hosts auto computed.",
                    HostKind::names()
                ))
            })?;
            return Ok(compose::strip_api_host(&base));
        }

        let api_host = self.source.api_host.as_deref().filter(|h| !h.is_empty());
        let cluster = self.source.cluster.as_deref().filter(|c| !c.is_empty());
        let namespace = self.source.namespace.as_deref().filter(|n| !n.is_empty());

        match (cluster, namespace) {
            (Some(cluster), Some(namespace))
                if api_host.is_none() || !self.options.flag(option_names::USE_API_HOST) =>
            {
                let domain = self
                    .options
                    .text(option_names::CLUSTER_DOMAIN)
                    .unwrap_or_else(|| self.settings.cluster_domain.clone());
                Ok(compose::cluster_host(namespace, cluster, &domain))
            }
            _ => api_host.map(compose::strip_api_host).ok_or_else(|| {
                SeedError::Config(
                    "Environment variable \"API_HOST\" is not set and cluster or namespace was \
                     not passed as an argument"
                        .to_string(),
                )
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use apiseed_domain::SharedOptions;
    use parking_lot::Mutex as SyncMutex;

    use super::*;

    /// Answers like a live host unless the host is listed as unreachable, or
    /// carries an app label while `reject_prefixed` is set.
    #[derive(Default)]
    struct FakeProbe {
        reject_prefixed: bool,
        unreachable: HashSet<String>,
        calls: SyncMutex<Vec<String>>,
    }

    #[async_trait]
    impl ReachabilityProbe for FakeProbe {
        async fn is_reachable(&self, host: &str) -> bool {
            self.calls.lock().push(host.to_string());
            let prefixed = ["admin.", "manager.", "consumer."].iter().any(|p| host.contains(p));
            if self.unreachable.contains(host) {
                return false;
            }
            !(self.reject_prefixed && prefixed)
        }
    }

    fn build_resolver(
        options: SharedOptions,
        source: HostSource,
        probe: Arc<FakeProbe>,
    ) -> HostResolver {
        HostResolver::new(Arc::new(options), source, ClientSettings::default(), probe)
    }

    async fn single(resolver: &HostResolver, kind: HostKind) -> String {
        resolver.get_host(kind.into(), false).await.unwrap().into_single().unwrap()
    }

    #[tokio::test]
    async fn resolves_prefixed_hosts_from_api_host() {
        for api_host in [
            "https://manager.ns1.cluster.dev.example.com",
            "https://admin.ns1.cluster.dev.example.com",
            "https://consumer.ns1.cluster.dev.example.com",
            "https://ns1.cluster.dev.example.com",
        ] {
            let probe = Arc::new(FakeProbe::default());
            let resolver =
                build_resolver(SharedOptions::new(), HostSource::from_api_host(api_host), probe);

            assert_eq!(
                single(&resolver, HostKind::Admin).await,
                "https://admin.ns1.cluster.dev.example.com"
            );
            assert_eq!(
                single(&resolver, HostKind::V5GatewayEndpoint).await,
                "https://ns1-gwd.cluster.dev.example.com"
            );
        }
    }

    #[tokio::test]
    async fn falls_back_to_bare_host_when_prefixed_probe_fails() {
        let probe = Arc::new(FakeProbe { reject_prefixed: true, ..FakeProbe::default() });
        let resolver = build_resolver(
            SharedOptions::new(),
            HostSource::from_api_host("https://ns4.cluster.dev.example.com"),
            probe,
        );

        let hosts = resolver.get_host(HostTarget::All, false).await.unwrap().into_all().unwrap();
        assert_eq!(hosts.admin, "https://ns4.cluster.dev.example.com");
        assert_eq!(hosts.manager, "https://ns4.cluster.dev.example.com");
        assert_eq!(hosts.consumer, "https://ns4.cluster.dev.example.com");
        assert_eq!(hosts.analytics_endpoint, "https://ai.ns4.cluster.dev.example.com");
    }

    #[tokio::test]
    async fn unreachable_manager_host_is_fatal() {
        let probe = Arc::new(FakeProbe {
            reject_prefixed: true,
            unreachable: HashSet::from(["https://ns9.cluster.dev.example.com".to_string()]),
            ..FakeProbe::default()
        });
        let resolver = build_resolver(
            SharedOptions::new(),
            HostSource::from_api_host("https://ns9.cluster.dev.example.com"),
            probe,
        );

        let err = resolver.get_host(HostKind::Manager.into(), false).await.unwrap_err();
        assert_eq!(
            err,
            SeedError::Network("API host ns9.cluster.dev.example.com is unreachable".into())
        );
    }

    #[tokio::test]
    async fn probes_once_per_base_host_until_reset() {
        let probe = Arc::new(FakeProbe::default());
        let resolver = build_resolver(
            SharedOptions::new(),
            HostSource::from_api_host("https://ns1.cluster.dev.example.com"),
            probe.clone(),
        );

        single(&resolver, HostKind::Admin).await;
        single(&resolver, HostKind::Consumer).await;
        resolver.get_host(HostTarget::All, false).await.unwrap();
        assert_eq!(probe.calls.lock().len(), 2);

        resolver.get_host(HostKind::Admin.into(), true).await.unwrap();
        assert_eq!(probe.calls.lock().len(), 4);
    }

    #[tokio::test]
    async fn concurrent_first_callers_share_one_probe_round() {
        let probe = Arc::new(FakeProbe::default());
        let resolver = Arc::new(build_resolver(
            SharedOptions::new(),
            HostSource::from_api_host("https://ns1.cluster.dev.example.com"),
            probe.clone(),
        ));

        let handles: Vec<_> = HostKind::ALL
            .into_iter()
            .map(|kind| {
                let resolver = resolver.clone();
                tokio::spawn(async move { resolver.host(kind).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(probe.calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn cluster_and_namespace_win_over_api_host() {
        let probe = Arc::new(FakeProbe::default());
        let source = HostSource {
            api_host: Some("https://manager.other.example.com".into()),
            cluster: Some("c7".into()),
            namespace: Some("ns3".into()),
        };
        let resolver = build_resolver(SharedOptions::new(), source.clone(), probe.clone());
        assert_eq!(
            single(&resolver, HostKind::Manager).await,
            "https://manager.ns3.c7.dev.ciondemand.com"
        );

        let options = SharedOptions::new();
        options.set(option_names::USE_API_HOST, true.into());
        let resolver = build_resolver(options, source, probe);
        assert_eq!(single(&resolver, HostKind::Manager).await, "https://manager.other.example.com");
    }

    #[tokio::test]
    async fn cluster_domain_option_and_http_flag() {
        let options = SharedOptions::new();
        options.set(option_names::CLUSTER_DOMAIN, "lab.example.net".into());
        options.set(option_names::HTTP, true.into());
        let resolver = build_resolver(
            options,
            HostSource::from_cluster("c1", "ns1"),
            Arc::new(FakeProbe::default()),
        );

        assert_eq!(
            single(&resolver, HostKind::PortalEndpoint).await,
            "http://api.portal.ns1.c1.lab.example.net"
        );
    }

    #[tokio::test]
    async fn lab_hosts_use_leading_gateway_label() {
        let resolver = build_resolver(
            SharedOptions::new(),
            HostSource::from_api_host("https://manager.my-stack.fyre.ibm.com"),
            Arc::new(FakeProbe::default()),
        );

        let hosts = resolver.get_host(HostTarget::All, false).await.unwrap().into_all().unwrap();
        assert_eq!(hosts.manager, "https://manager.my-stack.fyre.ibm.com");
        assert_eq!(hosts.v5_gateway_endpoint, "https://gwd.my-stack.fyre.ibm.com");
        assert_eq!(hosts.v6_gateway_endpoint_base, "https://rgw.my-stack.fyre.ibm.com");
    }

    #[tokio::test]
    async fn host_options_override_individual_kinds() {
        let options = SharedOptions::new();
        options.set(option_names::USE_HOST_OPTIONS, true.into());
        options.set(option_names::BASE_HOST, "https://ns6.cluster.dev.example.com".into());
        options.set("v5GatewayEndpoint", "https://my-gateway.com".into());
        let resolver =
            build_resolver(options, HostSource::default(), Arc::new(FakeProbe::default()));

        let hosts = resolver.get_host(HostTarget::All, false).await.unwrap().into_all().unwrap();
        assert_eq!(hosts.v5_gateway_endpoint, "https://my-gateway.com");
        assert_eq!(hosts.v6_gateway_endpoint, "https://ns6-rgwd.cluster.dev.example.com");
        assert_eq!(hosts.admin, "https://admin.ns6.cluster.dev.example.com");
    }

    #[tokio::test]
    async fn explicit_host_option_needs_no_base_host() {
        let options = SharedOptions::new();
        options.set(option_names::USE_HOST_OPTIONS, true.into());
        options.set("admin", "https://ns8.cluster.dev.example.com".into());
        let probe = Arc::new(FakeProbe::default());
        let resolver = build_resolver(options, HostSource::default(), probe.clone());

        assert_eq!(single(&resolver, HostKind::Admin).await, "https://ns8.cluster.dev.example.com");
        assert!(probe.calls.lock().is_empty());

        let err = resolver.get_host(HostKind::Manager.into(), true).await.unwrap_err();
        match err {
            SeedError::Config(msg) => {
                assert!(msg.starts_with("You must provide all required hosts (admin, manager"));
                assert!(msg.ends_with("to have hosts auto computed."));
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_host_source_is_a_config_error() {
        let resolver =
            build_resolver(SharedOptions::new(), HostSource::default(), Arc::new(FakeProbe::default()));

        let err = resolver.get_host(HostKind::Admin.into(), false).await.unwrap_err();
        assert!(matches!(err, SeedError::Config(msg) if msg.contains("\"API_HOST\" is not set")));
    }
}
