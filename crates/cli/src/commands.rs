//! Subcommand implementations

use std::collections::BTreeMap;
use std::time::Instant;

use anyhow::{bail, Context};
use apiseed_common::run_concurrent;
use apiseed_domain::{AppRole, Config, HostSource, HostTarget};
use apiseed_infra::{ApiClients, AuthClient, RequestFlags, RequestOptions, RequestResult, SignIn};
use reqwest::Method;
use serde::Serialize;
use tracing::info;

use crate::args::{CredentialArgs, TrafficArgs};

pub async fn hosts(
    config: &Config,
    source: HostSource,
    target: HostTarget,
    reset: bool,
) -> anyhow::Result<()> {
    let api = ApiClients::from_config(config, source).context("Failed to set up API clients")?;
    let hosts = api.resolver().get_host(target, reset).await.context("Failed to resolve hosts")?;

    println!("{}", serde_json::to_string_pretty(&hosts)?);
    Ok(())
}

pub async fn traffic(config: &Config, source: HostSource, args: TrafficArgs) -> anyhow::Result<()> {
    let api = ApiClients::from_config(config, source).context("Failed to set up API clients")?;
    let auth = AuthClient::new(api.clone(), config.auth.clone());
    let role = args.role;
    let method: Method = args.method.to_uppercase().parse().context("Invalid HTTP method")?;

    let signed_in = match args.credentials.token.clone() {
        Some(token) => {
            auth.set_auth_token(role, token)?;
            false
        }
        None => {
            let request = sign_in_request(role, args.credentials)?;
            auth.sign_in(request).await?.with_context(|| format!("Sign in to {role} failed"))?;
            true
        }
    };

    let limit = args.limit.unwrap_or(config.client.concurrency_limit);
    info!(calls = args.calls, limit, "Sending traffic to {role} {}", args.endpoint);

    let started = Instant::now();
    let endpoint = args.endpoint.as_str();
    let run = run_concurrent(
        |index: usize| {
            let api = api.clone();
            let options = RequestOptions::new(method.clone());
            let flags = RequestFlags::default().log_errors(false);
            let endpoint = endpoint.replace("{index}", &index.to_string());
            async move { api.send_request(role, &endpoint, options, flags, None).await }
        },
        |index| async move { Some(index) },
        args.calls,
        Some(limit),
    )
    .await;

    let results = close_session(&auth, role, signed_in, run).await?;

    let summary = TrafficSummary::from_results(&results, started.elapsed().as_millis());
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Sign out if this command signed in, whether or not `run` succeeded.
async fn close_session<T>(
    auth: &AuthClient,
    role: AppRole,
    signed_in: bool,
    run: apiseed_domain::Result<T>,
) -> anyhow::Result<T> {
    let signed_out = if signed_in { auth.sign_out(role).await.map(|_| ()) } else { Ok(()) };
    let value = run.context("Traffic run aborted")?;
    signed_out?;
    Ok(value)
}

fn sign_in_request(role: AppRole, credentials: CredentialArgs) -> anyhow::Result<SignIn> {
    let request = match (credentials.api_key, credentials.username, credentials.password) {
        (Some(api_key), _, _) => SignIn::api_key(role, api_key),
        (None, Some(username), Some(password)) => SignIn::password(role, username, password),
        _ => bail!("Provide --username and --password, --api-key or --token"),
    };

    let request = match credentials.idp {
        Some(idp) => request.identity_provider(idp),
        None => request,
    };

    Ok(match (credentials.provider_org, credentials.catalog) {
        (Some(org), Some(catalog)) => request.consumer_context(org, catalog),
        _ => request,
    })
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrafficSummary {
    calls: usize,
    succeeded: usize,
    failed: usize,
    exhausted: usize,
    statuses: BTreeMap<u16, usize>,
    elapsed_ms: u128,
}

impl TrafficSummary {
    fn from_results(results: &[RequestResult], elapsed_ms: u128) -> Self {
        let mut summary = Self { calls: results.len(), elapsed_ms, ..Self::default() };
        for result in results {
            if result.is_success() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            if result.retry_errors.is_some() {
                summary.exhausted += 1;
            }
            if let Some(status) = result.status {
                *summary.statuses.entry(status).or_default() += 1;
            }
        }
        summary
    }
}
