//! Authorization-code exchange pipeline.
//!
//! # Overview
//!
//! 1. **Check Callback** - Reject redirects carrying an OAuth error or no code
//! 2. **Exchange Code** - POST the authorization-code grant to the token endpoint
//! 3. **Fetch Claims** - Optionally call the userinfo endpoint (best-effort)
//! 4. **Normalize** - Take the subject identifier from the `email` claim
//!
//! # Example
//!
//! ```ignore
//! use mailchimp_authenticator::{
//!     AuthorizationCodeExchanger, CallbackRequest, HttpClientConfig, ProviderConfig,
//! };
//!
//! let exchanger = AuthorizationCodeExchanger::new(HttpClientConfig::default())?
//!     .with_span(tracing::info_span!("login", idp = "mailchimp"));
//!
//! let config = ProviderConfig::new("client-id", "client-secret", "https://idp.example.com/commonauth")
//!     .with_userinfo_endpoint("https://login.mailchimp.com/oauth2/metadata");
//!
//! let callback = CallbackRequest::from_query("code=abc&state=xyz");
//! let identity = exchanger.exchange_code(&callback, &config).await?;
//! if !identity.is_complete() {
//!     // no email claim: treat the login as incomplete
//! }
//! ```

use reqwest::header::ACCEPT;
use tracing::{Instrument, Span};

use crate::callback::CallbackRequest;
use crate::claims::{ClaimFetcher, ClaimSet};
use crate::config::{HttpClientConfig, ProviderConfig};
use crate::error::AuthError;
use crate::identity::AuthenticatedIdentity;
use crate::token::{OAuthErrorResponse, TokenRequest, TokenResponse};

/// Exchanges authorization codes for MailChimp identities.
///
/// Holds no per-request state; one instance can serve concurrent logins.
#[derive(Debug, Clone)]
pub struct AuthorizationCodeExchanger {
    /// HTTP client for the token endpoint, shared with the claim fetcher.
    http_client: reqwest::Client,
    /// Userinfo fetcher.
    claim_fetcher: ClaimFetcher,
    /// Transport limits and logging switches.
    config: HttpClientConfig,
    /// Parent for the per-exchange `mailchimp_auth` span.
    parent_span: Option<Span>,
}

impl AuthorizationCodeExchanger {
    /// Creates an exchanger with the given transport limits.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the limits are invalid, or
    /// `AuthError::HttpClient` if the HTTP client cannot be built.
    pub fn new(config: HttpClientConfig) -> Result<Self, AuthError> {
        config.validate()?;
        let http_client = config
            .build_client()
            .map_err(|e| AuthError::HttpClient(e.to_string()))?;

        Ok(Self {
            claim_fetcher: ClaimFetcher::with_client(http_client.clone(), config.clone()),
            http_client,
            config,
            parent_span: None,
        })
    }

    /// Records every exchange in a `mailchimp_auth` span nested under
    /// `span`. Without a parent the span is a child of whatever span is
    /// current when `exchange_code` is called.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.parent_span = Some(span);
        self
    }

    /// Returns the transport configuration.
    #[must_use]
    pub fn http_config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Exchanges the callback's authorization code and collects claims.
    ///
    /// Performs at most two outbound calls: the token request and, when
    /// `config.userinfo_endpoint` is set, the userinfo request.
    ///
    /// # Errors
    ///
    /// - `CallbackRejected` if the callback has an OAuth error or no code
    ///   (no request is sent)
    /// - `Configuration` if `config` fails validation (no request is sent)
    /// - `TokenExchangeFailed` if the token request fails; `error` and
    ///   `description` carry the provider's OAuth error when it sent one
    /// - `EmptyAccessToken` if the token response has no access token
    ///   (the userinfo endpoint is not called)
    ///
    /// A failed userinfo call is not an error; the identity is returned with
    /// no claims and an empty subject identifier.
    pub async fn exchange_code(
        &self,
        callback: &CallbackRequest,
        config: &ProviderConfig,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let span = match &self.parent_span {
            Some(parent) => tracing::info_span!(parent: parent, "mailchimp_auth"),
            None => tracing::info_span!("mailchimp_auth"),
        };
        self.exchange(callback, config).instrument(span).await
    }

    async fn exchange(
        &self,
        callback: &CallbackRequest,
        config: &ProviderConfig,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let code = callback.authorization_code().inspect_err(|e| {
            tracing::warn!("Rejecting authorization callback: {}", e);
        })?;
        config.validate()?;

        let token = self.request_token(config, code).await?;
        let access_token = token.access_token()?;

        let claims = match config.userinfo_endpoint.as_deref() {
            Some(url) => self.claim_fetcher.fetch_claims(url, access_token).await,
            None => {
                tracing::debug!("No userinfo endpoint configured. Proceeding without user claims");
                ClaimSet::new()
            }
        };

        let identity = AuthenticatedIdentity::from_claims(claims, access_token);
        if identity.is_complete() {
            if self.config.log_sensitive_payloads {
                tracing::info!(
                    "Authenticated user {} with {} claims",
                    identity.subject_identifier,
                    identity.claims.len()
                );
            } else {
                tracing::info!("Authenticated user with {} claims", identity.claims.len());
            }
        } else {
            tracing::warn!(
                "No email claim received; subject identifier is empty and authentication is incomplete"
            );
        }

        Ok(identity)
    }

    /// Sends the authorization-code grant and parses the response.
    async fn request_token(
        &self,
        config: &ProviderConfig,
        code: &str,
    ) -> Result<TokenResponse, AuthError> {
        let request = TokenRequest::new(config, code);

        tracing::debug!(
            "Exchanging authorization code with token endpoint: {}",
            config.token_endpoint
        );

        let response = self
            .http_client
            .post(&config.token_endpoint)
            .header(ACCEPT, "application/json")
            .form(&request.form_params())
            .send()
            .await
            .inspect_err(|e| tracing::warn!("Token request failed: {}", e))?;

        let status = response.status();
        if let Some(len) = response.content_length()
            && self.config.exceeds_response_limit(len)
        {
            return Err(self.oversized_token_response());
        }

        let bytes = response.bytes().await?;
        if bytes.len() > self.config.max_response_size {
            return Err(self.oversized_token_response());
        }
        let body = String::from_utf8_lossy(&bytes);

        if !status.is_success() {
            if let Some(oauth_error) = OAuthErrorResponse::parse(&body) {
                tracing::warn!(
                    "Token endpoint returned OAuth error {} (HTTP {})",
                    oauth_error.error,
                    status
                );
                return Err(oauth_error.into());
            }
            tracing::warn!("Token endpoint returned HTTP {}", status);
            return Err(AuthError::token_exchange_failed(format!("HTTP {status}")));
        }

        let token = TokenResponse::parse(&body)?;
        if token.access_token().is_err()
            && let Some(oauth_error) = OAuthErrorResponse::parse(&body)
        {
            return Err(oauth_error.into());
        }

        Ok(token)
    }

    fn oversized_token_response(&self) -> AuthError {
        let max_size = self.config.max_response_size;
        tracing::warn!("Token response exceeds maximum size of {} bytes", max_size);
        AuthError::token_exchange_failed(format!(
            "token response exceeds maximum size of {max_size} bytes"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_rejects_invalid_limits() {
        let config = HttpClientConfig::default().with_request_timeout(Duration::ZERO);
        let err = AuthorizationCodeExchanger::new(config).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_http_config_is_kept() {
        let config = HttpClientConfig::default().with_connect_timeout(Duration::from_secs(2));
        let exchanger = AuthorizationCodeExchanger::new(config).unwrap();
        assert_eq!(
            exchanger.http_config().connect_timeout,
            Duration::from_secs(2)
        );
    }

    #[tokio::test]
    async fn test_invalid_provider_config_sends_nothing() {
        let exchanger = AuthorizationCodeExchanger::new(HttpClientConfig::default()).unwrap();
        let config = ProviderConfig::new("", "secret", "https://idp.example.com/cb");
        let err = exchanger
            .exchange_code(&CallbackRequest::with_code("abc"), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_rejected_callback_precedes_config_check() {
        let exchanger = AuthorizationCodeExchanger::new(HttpClientConfig::default()).unwrap();
        let config = ProviderConfig::new("", "", "");
        let err = exchanger
            .exchange_code(&CallbackRequest::default(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::CallbackRejected { .. }));
    }
}
