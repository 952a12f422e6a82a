//! Sign-in, sign-out and identity-provider lookup per application role
//!
//! Tokens land in the façade's [`SessionStore`] under `token:<role>` and are
//! picked up by every later authenticated call for that role.

use std::fmt;

use apiseed_common::SessionStore;
use apiseed_domain::constants::{
    CONSUMER_CONTEXT_HEADER, CONSUMER_IDENTITY_PROVIDERS_PATH, CONSUMER_SIGN_OUT_PATH,
    CONSUMER_TOKEN_PATH, IDENTITY_PROVIDERS_PATH, SIGN_OUT_PATH, TOKEN_PATH,
};
use apiseed_domain::{AppRole, AuthSettings, Result, SeedError};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use crate::api::client::consumer_context;
use crate::api::report::report_error;
use crate::api::{ApiClients, RequestFlags, RequestOptions, RequestResult};

/// An identity provider (user registry) offered by an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProvider {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub default: bool,
}

/// Secret used to obtain a token.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Password { username: String, password: String },
    ApiKey(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::ApiKey(_) => f.debug_tuple("ApiKey").field(&"<redacted>").finish(),
        }
    }
}

/// Parameters of a sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignIn {
    pub role: AppRole,
    pub credentials: Credentials,
    /// Explicit identity provider; the role's default provider otherwise.
    pub identity_provider: Option<String>,
    /// Required for the consumer role.
    pub provider_org: Option<String>,
    /// Required for the consumer role.
    pub catalog: Option<String>,
}

impl SignIn {
    pub fn password(role: AppRole, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(
            role,
            Credentials::Password { username: username.into(), password: password.into() },
        )
    }

    pub fn api_key(role: AppRole, api_key: impl Into<String>) -> Self {
        Self::new(role, Credentials::ApiKey(api_key.into()))
    }

    fn new(role: AppRole, credentials: Credentials) -> Self {
        Self { role, credentials, identity_provider: None, provider_org: None, catalog: None }
    }

    #[must_use]
    pub fn identity_provider(mut self, name: impl Into<String>) -> Self {
        self.identity_provider = Some(name.into());
        self
    }

    #[must_use]
    pub fn consumer_context(mut self, provider_org: impl Into<String>, catalog: impl Into<String>) -> Self {
        self.provider_org = Some(provider_org.into());
        self.catalog = Some(catalog.into());
        self
    }

    fn context(&self) -> Result<Option<String>> {
        if self.role != AppRole::Consumer {
            return Ok(None);
        }
        consumer_context(
            self.provider_org.as_deref().unwrap_or_default(),
            self.catalog.as_deref().unwrap_or_default(),
        )
        .map(Some)
    }
}

/// Manages the bearer token of each application role.
#[derive(Clone)]
pub struct AuthClient {
    api: ApiClients,
    settings: AuthSettings,
}

impl AuthClient {
    pub fn new(api: ApiClients, settings: AuthSettings) -> Self {
        Self { api, settings }
    }

    fn store(&self) -> &SessionStore {
        self.api.session_store()
    }

    /// Identity providers the role's application offers. Sent without a
    /// token.
    ///
    /// # Errors
    /// `SeedError::InvalidInput` for the consumer role without org and
    /// catalog, plus any fatal façade error.
    pub async fn identity_providers(
        &self,
        role: AppRole,
        provider_org: Option<&str>,
        catalog: Option<&str>,
    ) -> Result<Vec<IdentityProvider>> {
        debug!("Getting list of identity providers available for {role}");

        let (endpoint, options) = match role {
            AppRole::Consumer => {
                let context = consumer_context(
                    provider_org.unwrap_or_default(),
                    catalog.unwrap_or_default(),
                )?;
                let options =
                    RequestOptions::default().header(CONSUMER_CONTEXT_HEADER, context);
                (CONSUMER_IDENTITY_PROVIDERS_PATH.to_string(), options)
            }
            _ => (
                IDENTITY_PROVIDERS_PATH.replace("{scope}", role.idp_scope()),
                RequestOptions::default(),
            ),
        };

        let result =
            self.api.send_request(role, &endpoint, options, RequestFlags::skip_auth(), None).await?;

        let providers = result
            .body
            .and_then(|mut body| body.get_mut("results").map(Value::take))
            .map(serde_json::from_value::<Vec<IdentityProvider>>)
            .transpose()?
            .unwrap_or_default();
        Ok(providers)
    }

    /// The provider flagged `default` for the role, if any.
    pub async fn default_identity_provider(
        &self,
        role: AppRole,
        provider_org: Option<&str>,
        catalog: Option<&str>,
    ) -> Result<Option<IdentityProvider>> {
        debug!("Getting default identity provider for {role}");
        let providers = self.identity_providers(role, provider_org, catalog).await?;
        Ok(providers.into_iter().find(|idp| idp.default))
    }

    /// Obtain and store a token for `request.role`.
    ///
    /// Returns the token response, or `None` (after reporting the failure)
    /// when no token was issued.
    ///
    /// # Errors
    /// - `SeedError::InvalidInput` for a consumer sign-in without org/catalog
    /// - `SeedError::Auth` when no identity provider can be determined
    #[instrument(skip(self, request), fields(role = %request.role))]
    pub async fn sign_in(&self, request: SignIn) -> Result<Option<RequestResult>> {
        let role = request.role;
        let context = request.context()?;
        debug!("Signing into {role}");

        let identity_provider = match request.identity_provider.clone() {
            Some(name) => name,
            None => self
                .default_identity_provider(role, request.provider_org.as_deref(), request.catalog.as_deref())
                .await?
                .map(|idp| idp.name)
                .ok_or_else(|| SeedError::Auth("Failed to get default identity provider".into()))?,
        };

        let scope = match (&context, role) {
            (Some(_), AppRole::Consumer) => format!(
                "consumer:{}:{}",
                request.provider_org.as_deref().unwrap_or_default(),
                request.catalog.as_deref().unwrap_or_default()
            ),
            _ => role.idp_scope().to_string(),
        };

        let (client_id, client_secret) = match role {
            AppRole::Consumer => {
                (&self.settings.consumer_client_id, &self.settings.consumer_client_secret)
            }
            _ => (&self.settings.client_id, &self.settings.client_secret),
        };

        let mut body = json!({
            "realm": format!("{scope}/{identity_provider}"),
            "client_id": client_id,
            "client_secret": client_secret,
            "grant_type": "password",
        });
        let principal = match &request.credentials {
            Credentials::Password { username, password } => {
                body["username"] = json!(username);
                body["password"] = json!(password);
                format!("user: {username}")
            }
            Credentials::ApiKey(api_key) => {
                body["apikey"] = json!(api_key);
                "API key".to_string()
            }
        };

        let endpoint = match role {
            AppRole::Consumer => CONSUMER_TOKEN_PATH,
            _ => TOKEN_PATH,
        };
        let mut options = RequestOptions::new(Method::POST).body(body);
        if let Some(context) = &context {
            options = options.header(CONSUMER_CONTEXT_HEADER, context.clone());
        }

        info!("Signing into {role} as {principal}");
        let result =
            self.api.send_request(role, endpoint, options, RequestFlags::skip_auth(), None).await?;

        let token = result
            .body
            .as_ref()
            .and_then(|body| body.get("access_token"))
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty());

        match token {
            Some(token) => {
                self.store().set(role.token_key(), token);
                match context {
                    Some(context) => self.store().set(role.context_key(), context),
                    None => self.store().remove(&role.context_key()),
                };
                info!("Signed into {role} successfully!");
                Ok(Some(result))
            }
            None => {
                report_error(self.api.options(), "Sign in failed!")?;
                Ok(None)
            }
        }
    }

    /// Invalidate the role's token server-side and forget it locally.
    ///
    /// Returns `true` when the server confirmed with 204; otherwise the
    /// failure is reported and the stored token is kept.
    ///
    /// # Errors
    /// `SeedError::Config` when the role is not signed in.
    #[instrument(skip(self))]
    pub async fn sign_out(&self, role: AppRole) -> Result<bool> {
        let endpoint = match role {
            AppRole::Consumer => CONSUMER_SIGN_OUT_PATH,
            _ => SIGN_OUT_PATH,
        };
        let result = self
            .api
            .send_request(role, endpoint, RequestOptions::new(Method::POST), RequestFlags::default(), None)
            .await?;

        if result.status == Some(204) {
            info!("Signed out of {role} successfully!");
            self.store().remove(&role.token_key());
            self.store().remove(&role.context_key());
            return Ok(true);
        }

        report_error(self.api.options(), format!("Sign out of {role} failed!"))?;
        Ok(false)
    }

    /// Store an externally obtained token (for example from an OIDC login).
    ///
    /// # Errors
    /// `SeedError::InvalidInput` when `token` is empty.
    pub fn set_auth_token(&self, role: AppRole, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if token.is_empty() {
            return Err(SeedError::InvalidInput("token is required".into()));
        }
        self.store().set(role.token_key(), token);
        Ok(())
    }

    /// Whether a token is stored for `role`.
    pub fn is_signed_in(&self, role: AppRole) -> bool {
        self.store().contains(&role.token_key())
    }
}
