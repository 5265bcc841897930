//! Authorization-code grant request and token endpoint responses.

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::ProviderConfig;
use crate::error::AuthError;

/// Form body of an RFC 6749 authorization-code token request.
///
/// The client secret is sent in the body (`client_secret_post`).
pub(crate) struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

impl<'a> TokenRequest<'a> {
    pub(crate) fn new(config: &'a ProviderConfig, code: &'a str) -> Self {
        Self {
            client_id: &config.client_id,
            client_secret: config.client_secret.expose(),
            code,
            redirect_uri: &config.callback_url,
        }
    }

    pub(crate) fn form_params(&self) -> [(&'static str, &'a str); 5] {
        [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id),
            ("client_secret", self.client_secret),
            ("code", self.code),
            ("redirect_uri", self.redirect_uri),
        ]
    }
}

/// Successful token endpoint response.
///
/// `access_token` may be empty; [`TokenResponse::access_token`] enforces that
/// it is not. All fields the provider sent are kept in `raw`.
#[derive(Clone)]
pub struct TokenResponse {
    access_token: String,

    /// Token type, usually "bearer".
    pub token_type: Option<String>,

    /// Token lifetime in seconds. MailChimp sends 0 (non-expiring).
    pub expires_in: Option<u64>,

    /// Granted scope.
    pub scope: Option<String>,

    /// Every top-level field of the response, including the ones above.
    pub raw: Map<String, Value>,
}

impl TokenResponse {
    /// Parses a token endpoint body.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExchangeFailed` if the body is not a JSON
    /// object.
    pub fn parse(body: &str) -> Result<Self, AuthError> {
        let value: Value = serde_json::from_str(body).map_err(|e| {
            AuthError::token_exchange_failed(format!("Failed to parse token response: {e}"))
        })?;
        let Value::Object(raw) = value else {
            return Err(AuthError::token_exchange_failed(
                "Token response is not a JSON object",
            ));
        };

        let str_field = |name: &str| raw.get(name).and_then(Value::as_str).map(String::from);

        Ok(Self {
            access_token: str_field("access_token").unwrap_or_default(),
            token_type: str_field("token_type"),
            expires_in: raw.get("expires_in").and_then(Value::as_u64),
            scope: str_field("scope"),
            raw,
        })
    }

    /// Returns the access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmptyAccessToken` if the provider sent no token, a
    /// blank one, or a non-string value.
    pub fn access_token(&self) -> Result<&str, AuthError> {
        if self.access_token.trim().is_empty() {
            return Err(AuthError::EmptyAccessToken);
        }
        Ok(&self.access_token)
    }
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("fields", &self.raw.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// OAuth error document (RFC 6749 §5.2).
#[derive(Debug, Deserialize)]
pub(crate) struct OAuthErrorResponse {
    pub(crate) error: String,
    pub(crate) error_description: Option<String>,
}

impl OAuthErrorResponse {
    /// Parses an error body, if it is one.
    pub(crate) fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

impl From<OAuthErrorResponse> for AuthError {
    fn from(err: OAuthErrorResponse) -> Self {
        AuthError::oauth_error(err.error, err.error_description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_params() {
        let config = ProviderConfig::new("client-1", "secret-1", "https://idp.example.com/cb");
        let request = TokenRequest::new(&config, "code-1");
        let params = request.form_params();

        assert_eq!(params[0], ("grant_type", "authorization_code"));
        assert!(params.contains(&("client_id", "client-1")));
        assert!(params.contains(&("client_secret", "secret-1")));
        assert!(params.contains(&("code", "code-1")));
        assert!(params.contains(&("redirect_uri", "https://idp.example.com/cb")));
    }

    #[test]
    fn test_parse_mailchimp_response() {
        let body = r#"{"access_token":"tok123","expires_in":0,"scope":null}"#;
        let response = TokenResponse::parse(body).unwrap();
        assert_eq!(response.access_token().unwrap(), "tok123");
        assert_eq!(response.expires_in, Some(0));
        assert!(response.scope.is_none());
        assert_eq!(response.raw.len(), 3);
    }

    #[test]
    fn test_missing_or_blank_token() {
        let response = TokenResponse::parse(r#"{"token_type":"bearer"}"#).unwrap();
        assert!(matches!(
            response.access_token(),
            Err(AuthError::EmptyAccessToken)
        ));

        let response = TokenResponse::parse(r#"{"access_token":""}"#).unwrap();
        assert!(matches!(
            response.access_token(),
            Err(AuthError::EmptyAccessToken)
        ));

        let response = TokenResponse::parse(r#"{"access_token":42}"#).unwrap();
        assert!(response.access_token().is_err());
    }

    #[test]
    fn test_parse_rejects_non_object() {
        let err = TokenResponse::parse("[1,2]").unwrap_err();
        assert!(matches!(err, AuthError::TokenExchangeFailed { .. }));

        let err = TokenResponse::parse("<html>").unwrap_err();
        assert!(err.to_string().contains("Failed to parse token response"));
    }

    #[test]
    fn test_debug_hides_token() {
        let response = TokenResponse::parse(r#"{"access_token":"tok123"}"#).unwrap();
        let debug = format!("{response:?}");
        assert!(!debug.contains("tok123"));
        assert!(debug.contains("access_token"));
    }

    #[test]
    fn test_oauth_error_conversion() {
        let parsed = OAuthErrorResponse::parse(
            r#"{"error":"invalid_grant","error_description":"Invalid authorization code"}"#,
        )
        .unwrap();
        let err: AuthError = parsed.into();
        assert!(matches!(err, AuthError::TokenExchangeFailed { .. }));
        assert_eq!(err.oauth_error_code(), Some("invalid_grant"));
        assert!(err.to_string().contains("Invalid authorization code"));

        assert!(OAuthErrorResponse::parse("Bad Gateway").is_none());
    }
}
