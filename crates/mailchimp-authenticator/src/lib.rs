//! # mailchimp-authenticator
//!
//! Federated authenticator that delegates end-user login to MailChimp's
//! OAuth2 provider.
//!
//! This crate provides:
//! - The authorization redirect URL for MailChimp's consent page
//! - Authorization-code exchange at MailChimp's token endpoint
//! - Best-effort profile claims from the userinfo (metadata) endpoint
//! - A normalized [`AuthenticatedIdentity`] keyed by the `email` claim
//!
//! ## Modules
//!
//! - [`authenticator`] - Host-facing [`FederatedAuthenticator`] trait and the MailChimp implementation
//! - [`exchanger`] - The authorization-code exchange pipeline
//! - [`claims`] - Claim sets and the userinfo fetch
//! - [`callback`] - Parsing of the provider redirect
//! - [`token`] - Token endpoint request/response types
//! - [`identity`] - The authenticated-user record
//! - [`config`] - Provider and HTTP client configuration
//! - [`properties`] - Operator-facing property metadata
//! - [`error`] - Error types

pub mod authenticator;
pub mod callback;
pub mod claims;
pub mod config;
pub mod error;
pub mod exchanger;
pub mod identity;
pub mod properties;
pub mod token;

pub use authenticator::{FederatedAuthenticator, MailChimpAuthenticator, ProviderEndpoints};
pub use callback::CallbackRequest;
pub use claims::{ClaimFetcher, ClaimSet, EMAIL_CLAIM};
pub use config::{
    AuthenticatorSettings, ClientSecret, ConfigError, HttpClientConfig,
    MAILCHIMP_AUTHORIZATION_ENDPOINT, MAILCHIMP_TOKEN_ENDPOINT, ProviderConfig,
};
pub use error::AuthError;
pub use exchanger::AuthorizationCodeExchanger;
pub use identity::AuthenticatedIdentity;
pub use properties::Property;
pub use token::TokenResponse;

/// Type alias for authenticator results.
pub type AuthResult<T> = Result<T, AuthError>;
