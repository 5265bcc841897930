//! Host-facing authenticator capability.
//!
//! A host drives login through [`FederatedAuthenticator`]: it renders
//! [`FederatedAuthenticator::configuration_properties`] to operators,
//! redirects users to [`FederatedAuthenticator::authorization_url`], and
//! passes the redirect back to [`FederatedAuthenticator::exchange_code`].
//! Session state, chaining and request plumbing stay with the host.

use async_trait::async_trait;
use serde::Serialize;
use tracing::Span;
use url::Url;

use crate::callback::CallbackRequest;
use crate::config::{ConfigError, HttpClientConfig, ProviderConfig};
use crate::error::AuthError;
use crate::exchanger::AuthorizationCodeExchanger;
use crate::identity::AuthenticatedIdentity;
use crate::properties::{
    AUTHENTICATOR_FRIENDLY_NAME, AUTHENTICATOR_NAME, Property, configuration_properties,
};

/// Endpoints an authenticator talks to for one provider registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderEndpoints {
    /// Where users are redirected to grant consent.
    pub authorization: String,
    /// Where authorization codes are exchanged.
    pub token: String,
    /// Where profile claims are fetched, if configured.
    pub userinfo: Option<String>,
}

/// A provider-specific federated authenticator.
#[async_trait]
pub trait FederatedAuthenticator: Send + Sync {
    /// Internal name used by the host to register the authenticator.
    fn name(&self) -> &str;

    /// Name shown to end users.
    fn friendly_name(&self) -> &str;

    /// Property metadata for the host's provider editor.
    fn configuration_properties(&self) -> Vec<Property>;

    /// Resolves the endpoints used for `config`.
    fn resolve_endpoints(&self, config: &ProviderConfig) -> ProviderEndpoints;

    /// OAuth scope requested at the authorization endpoint.
    fn scope(&self) -> &str;

    /// Whether the provider issues an OIDC ID token that must be validated.
    fn requires_id_token(&self) -> bool;

    /// Builds the URL the user is redirected to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the authorization endpoint is
    /// not a valid URL.
    fn authorization_url(&self, config: &ProviderConfig, state: &str) -> Result<Url, AuthError> {
        let endpoints = self.resolve_endpoints(config);
        let mut url = Url::parse(&endpoints.authorization).map_err(|e| {
            ConfigError::InvalidValue(format!("authorization_endpoint is not a valid URL: {e}"))
        })?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &config.client_id)
            .append_pair("redirect_uri", &config.callback_url)
            .append_pair("scope", self.scope())
            .append_pair("state", state);

        tracing::debug!(
            "Generated authorization URL for {}: {}",
            self.name(),
            url.as_str().split('?').next().unwrap_or("")
        );
        Ok(url)
    }

    /// Completes the login from the provider's redirect.
    async fn exchange_code(
        &self,
        callback: &CallbackRequest,
        config: &ProviderConfig,
    ) -> Result<AuthenticatedIdentity, AuthError>;
}

/// MailChimp OAuth2 authenticator.
///
/// MailChimp has fixed authorization and token endpoints, takes no scope and
/// issues no ID token.
#[derive(Debug, Clone)]
pub struct MailChimpAuthenticator {
    exchanger: AuthorizationCodeExchanger,
}

impl MailChimpAuthenticator {
    /// Creates an authenticator with the given transport limits.
    ///
    /// # Errors
    ///
    /// See [`AuthorizationCodeExchanger::new`].
    pub fn new(http: HttpClientConfig) -> Result<Self, AuthError> {
        Ok(Self {
            exchanger: AuthorizationCodeExchanger::new(http)?,
        })
    }

    /// Creates an authenticator around an existing exchanger.
    #[must_use]
    pub fn with_exchanger(exchanger: AuthorizationCodeExchanger) -> Self {
        Self { exchanger }
    }

    /// Nests the span of every exchange under `span`.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.exchanger = self.exchanger.with_span(span);
        self
    }

    /// Returns the underlying exchanger.
    #[must_use]
    pub fn exchanger(&self) -> &AuthorizationCodeExchanger {
        &self.exchanger
    }
}

#[async_trait]
impl FederatedAuthenticator for MailChimpAuthenticator {
    fn name(&self) -> &str {
        AUTHENTICATOR_NAME
    }

    fn friendly_name(&self) -> &str {
        AUTHENTICATOR_FRIENDLY_NAME
    }

    fn configuration_properties(&self) -> Vec<Property> {
        configuration_properties()
    }

    fn resolve_endpoints(&self, config: &ProviderConfig) -> ProviderEndpoints {
        ProviderEndpoints {
            authorization: config.authorization_endpoint.clone(),
            token: config.token_endpoint.clone(),
            userinfo: config.userinfo_endpoint.clone(),
        }
    }

    fn scope(&self) -> &str {
        ""
    }

    fn requires_id_token(&self) -> bool {
        false
    }

    async fn exchange_code(
        &self,
        callback: &CallbackRequest,
        config: &ProviderConfig,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        self.exchanger.exchange_code(callback, config).await
    }
}
