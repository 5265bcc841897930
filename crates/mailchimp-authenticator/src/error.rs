//! Error types for the MailChimp authenticator.
//!
//! Only three kinds of failure end a login attempt: the redirect itself was
//! rejected, the token exchange failed, or the exchange produced no usable
//! access token. Userinfo failures are not errors; they degrade to an empty
//! claim set (see [`crate::claims`]).

use crate::config::ConfigError;

/// Errors that abort an authorization-code exchange.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The inbound redirect carried an OAuth error or no authorization code.
    #[error("Callback rejected: {reason}")]
    CallbackRejected {
        /// Why the callback was rejected.
        reason: String,
    },

    /// The token endpoint could not be reached or answered with a failure.
    ///
    /// `error` and `description` are set when the provider sent an OAuth
    /// error document (RFC 6749 §5.2).
    #[error("Token exchange failed: {message}")]
    TokenExchangeFailed {
        /// Transport, HTTP status or OAuth error detail.
        message: String,
        /// The OAuth `error` code.
        error: Option<String>,
        /// The OAuth `error_description`.
        description: Option<String>,
    },

    /// The token endpoint answered successfully but without an access token.
    #[error("Access token is empty or null")]
    EmptyAccessToken,

    /// The provider configuration is unusable.
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl AuthError {
    /// Creates a `CallbackRejected` error.
    #[must_use]
    pub fn callback_rejected(reason: impl Into<String>) -> Self {
        Self::CallbackRejected {
            reason: reason.into(),
        }
    }

    /// Creates a `TokenExchangeFailed` error.
    #[must_use]
    pub fn token_exchange_failed(message: impl Into<String>) -> Self {
        Self::TokenExchangeFailed {
            message: message.into(),
            error: None,
            description: None,
        }
    }

    /// Creates a `TokenExchangeFailed` error from an OAuth error response.
    #[must_use]
    pub fn oauth_error(error: impl Into<String>, description: Option<String>) -> Self {
        let error = error.into();
        let message = match description.as_deref() {
            Some(desc) if !desc.is_empty() => format!("{error} - {desc}"),
            _ => error.clone(),
        };
        Self::TokenExchangeFailed {
            message,
            error: Some(error),
            description,
        }
    }

    /// Returns the OAuth `error` code reported by the token endpoint, if any.
    #[must_use]
    pub fn oauth_error_code(&self) -> Option<&str> {
        match self {
            Self::TokenExchangeFailed { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` if this error ends the current login attempt.
    ///
    /// The user can retry by starting a new authorization; configuration
    /// errors need operator action instead.
    #[must_use]
    pub fn is_terminal_for_attempt(&self) -> bool {
        matches!(
            self,
            Self::CallbackRejected { .. } | Self::TokenExchangeFailed { .. } | Self::EmptyAccessToken
        )
    }

    /// Returns `true` if this error came from the token exchange step.
    #[must_use]
    pub fn is_exchange_error(&self) -> bool {
        matches!(
            self,
            Self::TokenExchangeFailed { .. } | Self::EmptyAccessToken
        )
    }

    /// Returns `true` if the provider (rather than the transport or local
    /// configuration) reported the failure.
    #[must_use]
    pub fn is_provider_error(&self) -> bool {
        match self {
            Self::CallbackRejected { .. } | Self::EmptyAccessToken => true,
            Self::TokenExchangeFailed { error, .. } => error.is_some(),
            _ => false,
        }
    }

    /// Returns `true` if the failure is caused by local setup and not by the
    /// login attempt itself.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::HttpClient(_))
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest errors may embed the request URL but never the form body.
        let message = if err.is_timeout() {
            "request to token endpoint timed out".to_string()
        } else if err.is_connect() {
            "could not connect to token endpoint".to_string()
        } else {
            err.without_url().to_string()
        };
        Self::token_exchange_failed(message)
    }
}
