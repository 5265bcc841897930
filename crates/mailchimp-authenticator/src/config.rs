//! Provider and HTTP client configuration.
//!
//! [`ProviderConfig`] is the typed form of the four operator-facing properties
//! (see [`crate::properties`]) plus the fixed MailChimp endpoints.
//! [`HttpClientConfig`] carries the transport limits applied to every outbound
//! call.
//!
//! # Example (TOML)
//!
//! ```toml
//! [provider]
//! client_id = "123456789"
//! client_secret = "s3cr3t"
//! callback_url = "https://idp.example.com/commonauth"
//! userinfo_endpoint = "https://login.mailchimp.com/oauth2/metadata"
//!
//! [http]
//! connect_timeout = "5s"
//! request_timeout = "10s"
//! ```

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::properties::{CALLBACK_URL, CLIENT_ID, CLIENT_SECRET, USERINFO_ENDPOINT};

/// MailChimp OAuth2 authorization endpoint.
pub const MAILCHIMP_AUTHORIZATION_ENDPOINT: &str = "https://login.mailchimp.com/oauth2/authorize";

/// MailChimp OAuth2 token endpoint.
pub const MAILCHIMP_TOKEN_ENDPOINT: &str = "https://login.mailchimp.com/oauth2/token";

const REDACTED: &str = "[REDACTED]";

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),

    /// The configuration sources could not be read or merged.
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

/// OAuth client secret.
///
/// Never printed: `Debug`, `Display` and serialization all emit `[REDACTED]`.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSecret(String);

impl ClientSecret {
    /// Wraps a secret value.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the raw secret for use in an outbound request body.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the secret is empty or whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl Serialize for ClientSecret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

impl<'de> Deserialize<'de> for ClientSecret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self)
    }
}

/// Configuration for one MailChimp identity provider registration.
///
/// Immutable once built; the authenticator only ever borrows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OAuth client ID registered with MailChimp.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: ClientSecret,

    /// Redirect URI sent with both the authorization and token requests.
    pub callback_url: String,

    /// Authorization endpoint the user is redirected to.
    #[serde(default = "default_authorization_endpoint")]
    pub authorization_endpoint: String,

    /// Token endpoint the authorization code is exchanged at.
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,

    /// Optional endpoint returning profile claims for an access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,
}

fn default_authorization_endpoint() -> String {
    MAILCHIMP_AUTHORIZATION_ENDPOINT.to_string()
}

fn default_token_endpoint() -> String {
    MAILCHIMP_TOKEN_ENDPOINT.to_string()
}

impl ProviderConfig {
    /// Creates a configuration with the fixed MailChimp endpoints and no
    /// userinfo endpoint.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: ClientSecret::new(client_secret),
            callback_url: callback_url.into(),
            authorization_endpoint: default_authorization_endpoint(),
            token_endpoint: default_token_endpoint(),
            userinfo_endpoint: None,
        }
    }

    /// Sets the userinfo endpoint.
    #[must_use]
    pub fn with_userinfo_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.userinfo_endpoint = Some(endpoint.into());
        self
    }

    /// Overrides the authorization endpoint.
    #[must_use]
    pub fn with_authorization_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.authorization_endpoint = endpoint.into();
        self
    }

    /// Overrides the token endpoint.
    #[must_use]
    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    /// Builds a configuration from the host's name/value property bag.
    ///
    /// `default_callback_url` is used when the operator left the callback URL
    /// blank. A blank userinfo endpoint is treated as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the client ID or secret is absent,
    /// or any error from [`ProviderConfig::validate`].
    pub fn from_properties(
        properties: &HashMap<String, String>,
        default_callback_url: &str,
    ) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            properties
                .get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        let client_id = get(CLIENT_ID).ok_or_else(|| ConfigError::Missing(CLIENT_ID.into()))?;
        let client_secret =
            get(CLIENT_SECRET).ok_or_else(|| ConfigError::Missing(CLIENT_SECRET.into()))?;
        let callback_url = get(CALLBACK_URL).unwrap_or(default_callback_url);

        let mut config = Self::new(client_id, client_secret, callback_url);
        config.userinfo_endpoint = get(USERINFO_ENDPOINT).map(String::from);
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the client ID, secret or callback URL
    /// is blank, and `ConfigError::InvalidValue` if any URL is not an absolute
    /// `http`/`https` URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::Missing("client_id".to_string()));
        }
        if self.client_secret.is_blank() {
            return Err(ConfigError::Missing("client_secret".to_string()));
        }
        if self.callback_url.trim().is_empty() {
            return Err(ConfigError::Missing("callback_url".to_string()));
        }

        validate_http_url("callback_url", &self.callback_url)?;
        validate_http_url("authorization_endpoint", &self.authorization_endpoint)?;
        validate_http_url("token_endpoint", &self.token_endpoint)?;
        if let Some(endpoint) = &self.userinfo_endpoint {
            validate_http_url("userinfo_endpoint", endpoint)?;
        }

        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidValue(format!("{field} is not a valid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidValue(format!(
            "{field} must use http or https, got '{other}'"
        ))),
    }
}

/// Transport limits for calls to the token and userinfo endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// TCP connect timeout.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Whole-request timeout, including reading the body.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Largest userinfo body that will be parsed, in bytes.
    pub max_response_size: usize,

    /// Log claim values and raw userinfo bodies at debug level.
    /// Off by default since they carry personal data.
    pub log_sensitive_payloads: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            max_response_size: 1024 * 1024, // 1 MB
            log_sensitive_payloads: false,
        }
    }
}

impl HttpClientConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the whole-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the maximum userinfo response size.
    #[must_use]
    pub fn with_max_response_size(mut self, size: usize) -> Self {
        self.max_response_size = size;
        self
    }

    /// Enables debug logging of claim values.
    #[must_use]
    pub fn with_log_sensitive_payloads(mut self, enabled: bool) -> Self {
        self.log_sensitive_payloads = enabled;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a timeout or the size limit is
    /// zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "connect_timeout must be > 0".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "request_timeout must be > 0".to_string(),
            ));
        }
        if self.max_response_size == 0 {
            return Err(ConfigError::InvalidValue(
                "max_response_size must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the shared HTTP client with these limits.
    pub(crate) fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()
    }

    /// Returns `true` if a body of `len` bytes is over `max_response_size`.
    pub(crate) fn exceeds_response_limit(&self, len: u64) -> bool {
        usize::try_from(len).map_or(true, |len| len > self.max_response_size)
    }
}

/// Everything needed to stand up one authenticator instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatorSettings {
    /// Provider registration.
    pub provider: ProviderConfig,

    /// Transport limits.
    #[serde(default)]
    pub http: HttpClientConfig,
}

impl AuthenticatorSettings {
    /// Validates both sections.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by either section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.provider.validate()?;
        self.http.validate()
    }
}

pub mod loader {
    //! Layered loading of [`AuthenticatorSettings`].
    //!
    //! Sources, lowest precedence first: an optional TOML file, then
    //! `MAILCHIMP_AUTH__*` environment variables
    //! (e.g. `MAILCHIMP_AUTH__PROVIDER__CLIENT_ID`).

    use std::path::Path;

    use config::{Config, Environment, File};

    use super::{AuthenticatorSettings, ConfigError};

    /// Environment variable prefix.
    pub const ENV_PREFIX: &str = "MAILCHIMP_AUTH";

    /// Loads and validates settings.
    ///
    /// A `path` that does not exist is skipped so environment-only setups work.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if the sources cannot be merged or
    /// deserialized, or a validation error.
    pub fn load_settings(path: Option<&Path>) -> Result<AuthenticatorSettings, ConfigError> {
        let mut builder = Config::builder();
        if let Some(p) = path
            && p.exists()
        {
            builder = builder.add_source(File::from(p));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let cfg = builder
            .build()
            .map_err(|e| ConfigError::Load(format!("config build error: {e}")))?;
        let settings: AuthenticatorSettings = cfg
            .try_deserialize()
            .map_err(|e| ConfigError::Load(format!("config deserialize error: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> ProviderConfig {
        ProviderConfig::new("client-1", "secret-1", "https://idp.example.com/commonauth")
    }

    #[test]
    fn test_new_uses_fixed_endpoints() {
        let config = valid_config();
        assert_eq!(config.authorization_endpoint, MAILCHIMP_AUTHORIZATION_ENDPOINT);
        assert_eq!(config.token_endpoint, MAILCHIMP_TOKEN_ENDPOINT);
        assert!(config.userinfo_endpoint.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_secret_is_redacted() {
        let config = valid_config();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-1"));
        assert!(debug.contains("[REDACTED]"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret-1"));
        assert_eq!(config.client_secret.expose(), "secret-1");
    }

    #[test]
    fn test_secret_deserializes_from_plain_string() {
        let json = r#"{
            "client_id": "abc",
            "client_secret": "xyz",
            "callback_url": "https://idp.example.com/cb"
        }"#;
        let config: ProviderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.client_secret.expose(), "xyz");
        assert_eq!(config.token_endpoint, MAILCHIMP_TOKEN_ENDPOINT);
    }

    #[test]
    fn test_validate_missing_fields() {
        let mut config = valid_config();
        config.client_id = "  ".to_string();
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::Missing("client_id".to_string())
        );

        let mut config = valid_config();
        config.client_secret = ClientSecret::new("");
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::Missing("client_secret".to_string())
        );

        let mut config = valid_config();
        config.callback_url = String::new();
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::Missing("callback_url".to_string())
        );
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let config = valid_config().with_userinfo_endpoint("not a url");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("userinfo_endpoint"));

        let config = valid_config().with_token_endpoint("ftp://login.mailchimp.com/token");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
        assert!(err.to_string().contains("token_endpoint"));
    }

    #[test]
    fn test_from_properties() {
        let mut props = HashMap::new();
        props.insert(CLIENT_ID.to_string(), "client-1".to_string());
        props.insert(CLIENT_SECRET.to_string(), "secret-1".to_string());
        props.insert(USERINFO_ENDPOINT.to_string(), "   ".to_string());

        let config =
            ProviderConfig::from_properties(&props, "https://idp.example.com/commonauth").unwrap();
        assert_eq!(config.client_id, "client-1");
        assert_eq!(config.callback_url, "https://idp.example.com/commonauth");
        assert!(config.userinfo_endpoint.is_none());

        props.insert(
            CALLBACK_URL.to_string(),
            "https://other.example.com/cb".to_string(),
        );
        props.insert(
            USERINFO_ENDPOINT.to_string(),
            "https://login.mailchimp.com/oauth2/metadata".to_string(),
        );
        let config =
            ProviderConfig::from_properties(&props, "https://idp.example.com/commonauth").unwrap();
        assert_eq!(config.callback_url, "https://other.example.com/cb");
        assert_eq!(
            config.userinfo_endpoint.as_deref(),
            Some("https://login.mailchimp.com/oauth2/metadata")
        );
    }

    #[test]
    fn test_from_properties_requires_credentials() {
        let mut props = HashMap::new();
        props.insert(CLIENT_ID.to_string(), "client-1".to_string());
        let err = ProviderConfig::from_properties(&props, "https://idp.example.com/cb").unwrap_err();
        assert_eq!(err, ConfigError::Missing(CLIENT_SECRET.to_string()));

        let props = HashMap::new();
        let err = ProviderConfig::from_properties(&props, "https://idp.example.com/cb").unwrap_err();
        assert_eq!(err, ConfigError::Missing(CLIENT_ID.to_string()));
    }

    #[test]
    fn test_http_defaults() {
        let http = HttpClientConfig::default();
        assert_eq!(http.connect_timeout, Duration::from_secs(5));
        assert_eq!(http.request_timeout, Duration::from_secs(10));
        assert_eq!(http.max_response_size, 1024 * 1024);
        assert!(!http.log_sensitive_payloads);
        assert!(http.validate().is_ok());
    }

    #[test]
    fn test_http_validation() {
        let http = HttpClientConfig::new().with_connect_timeout(Duration::ZERO);
        assert!(http.validate().unwrap_err().to_string().contains("connect_timeout"));

        let http = HttpClientConfig::new().with_request_timeout(Duration::ZERO);
        assert!(http.validate().unwrap_err().to_string().contains("request_timeout"));

        let http = HttpClientConfig::new().with_max_response_size(0);
        assert!(
            http.validate()
                .unwrap_err()
                .to_string()
                .contains("max_response_size")
        );
    }

    #[test]
    fn test_response_limit() {
        let http = HttpClientConfig::new().with_max_response_size(64);
        assert!(!http.exceeds_response_limit(0));
        assert!(!http.exceeds_response_limit(64));
        assert!(http.exceeds_response_limit(65));
        assert!(http.exceeds_response_limit(u64::MAX));
    }

    #[test]
    fn test_load_settings_from_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[provider]
client_id = "client-1"
client_secret = "secret-1"
callback_url = "https://idp.example.com/commonauth"

[http]
connect_timeout = "2s"
request_timeout = "4s"
"#
        )
        .unwrap();

        let settings = loader::load_settings(Some(file.path())).unwrap();
        assert_eq!(settings.provider.client_id, "client-1");
        assert_eq!(settings.provider.client_secret.expose(), "secret-1");
        assert_eq!(settings.provider.token_endpoint, MAILCHIMP_TOKEN_ENDPOINT);
        assert_eq!(settings.http.connect_timeout, Duration::from_secs(2));
        assert_eq!(settings.http.request_timeout, Duration::from_secs(4));
        assert_eq!(settings.http.max_response_size, 1024 * 1024);
    }

    #[test]
    fn test_load_settings_rejects_invalid_values() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[provider]
client_id = "client-1"
client_secret = "secret-1"
callback_url = "mailto:nobody@example.com"
"#
        )
        .unwrap();

        let err = loader::load_settings(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("callback_url"));
    }
}
