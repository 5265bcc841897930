//! User claims and the MailChimp userinfo fetch.
//!
//! MailChimp's metadata endpoint does not accept a bearer header; the access
//! token is posted as `{"apikey": "<token>"}`. That convention is specific to
//! this provider and lives only here.
//!
//! Claim enrichment is best-effort. [`ClaimFetcher::fetch_claims`] never
//! fails: every problem collapses to an empty [`ClaimSet`] and a log line, so
//! an unavailable profile endpoint cannot block a login.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::Serialize;
use serde_json::Value;

use crate::config::HttpClientConfig;
use crate::error::AuthError;

/// Claim name used as the subject identifier.
pub const EMAIL_CLAIM: &str = "email";

/// Flat claim name → string value mapping.
///
/// Ordered by name so iteration and serialization are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClaimSet(BTreeMap<String, String>);

impl ClaimSet {
    /// Creates an empty claim set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a claim set from a JSON document.
    ///
    /// Returns `None` unless the document is a JSON object. Each top-level
    /// field becomes one claim (see [`claim_value`] for the coercion).
    #[must_use]
    pub fn from_json_str(json: &str) -> Option<Self> {
        serde_json::from_str::<Value>(json)
            .ok()
            .and_then(|value| Self::from_json_value(&value))
    }

    /// Builds a claim set from a parsed JSON value, if it is an object.
    #[must_use]
    pub fn from_json_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(
            object
                .iter()
                .map(|(key, value)| (key.clone(), claim_value(value)))
                .collect(),
        )
    }

    /// Returns the value of a claim.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns `true` if the claim is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Adds or replaces a claim, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    /// Number of claims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no claims.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates claims in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl FromIterator<(String, String)> for ClaimSet {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ClaimSet {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// String form of a JSON claim value.
///
/// Strings are taken verbatim, `null` becomes an empty string, and every
/// other value (numbers, booleans, arrays, objects) uses its compact JSON
/// text.
#[must_use]
pub fn claim_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Reasons a userinfo fetch produced no claims.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ClaimFetchError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("HTTP error: status {0}")]
    HttpStatus(u16),

    #[error("response exceeds maximum size of {max_size} bytes")]
    ResponseTooLarge { max_size: usize },

    #[error("empty response body")]
    EmptyBody,

    #[error("response is not a JSON object")]
    NotAnObject,
}

/// Fetches profile claims from a userinfo endpoint.
#[derive(Debug, Clone)]
pub struct ClaimFetcher {
    http_client: reqwest::Client,
    config: HttpClientConfig,
}

impl ClaimFetcher {
    /// Creates a fetcher with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::HttpClient` if the client cannot be built.
    pub fn new(config: HttpClientConfig) -> Result<Self, AuthError> {
        let http_client = config
            .build_client()
            .map_err(|e| AuthError::HttpClient(e.to_string()))?;
        Ok(Self::with_client(http_client, config))
    }

    /// Creates a fetcher that shares an existing HTTP client.
    #[must_use]
    pub fn with_client(http_client: reqwest::Client, config: HttpClientConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Fetches claims for `access_token` from `userinfo_url`.
    ///
    /// Sends exactly one request and never retries. Any failure (transport,
    /// non-success status, oversized, empty or non-object body) yields an
    /// empty claim set.
    pub async fn fetch_claims(&self, userinfo_url: &str, access_token: &str) -> ClaimSet {
        tracing::debug!("Claim URL: {}", userinfo_url);

        match self.try_fetch(userinfo_url, access_token).await {
            Ok(claims) => {
                tracing::debug!("Fetched {} user claims", claims.len());
                claims
            }
            Err(ClaimFetchError::EmptyBody) => {
                tracing::debug!("Unable to fetch user claims. Proceeding without user claims");
                ClaimSet::new()
            }
            Err(e) => {
                tracing::warn!(
                    "Error occurred while accessing user info endpoint {}: {}",
                    userinfo_url,
                    e
                );
                ClaimSet::new()
            }
        }
    }

    async fn try_fetch(
        &self,
        userinfo_url: &str,
        access_token: &str,
    ) -> Result<ClaimSet, ClaimFetchError> {
        let response = self
            .http_client
            .post(userinfo_url)
            .json(&serde_json::json!({ "apikey": access_token }))
            .send()
            .await
            .map_err(|e| ClaimFetchError::Network(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(ClaimFetchError::HttpStatus(response.status().as_u16()));
        }

        let max_size = self.config.max_response_size;
        if let Some(len) = response.content_length()
            && self.config.exceeds_response_limit(len)
        {
            return Err(ClaimFetchError::ResponseTooLarge { max_size });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ClaimFetchError::Network(e.without_url().to_string()))?;
        if body.len() > max_size {
            return Err(ClaimFetchError::ResponseTooLarge { max_size });
        }

        let text = String::from_utf8_lossy(&body);
        if text.trim().is_empty() {
            return Err(ClaimFetchError::EmptyBody);
        }
        if self.config.log_sensitive_payloads {
            tracing::debug!("Userinfo response: {}", text);
        }

        let claims = ClaimSet::from_json_str(&text).ok_or(ClaimFetchError::NotAnObject)?;
        if self.config.log_sensitive_payloads {
            for (key, value) in claims.iter() {
                tracing::debug!("Adding claims from end-point data mapping : {} - {}", key, value);
            }
        }

        Ok(claims)
    }
}
