//! Parsing of the provider's redirect back to the host.

use url::Url;
use url::form_urlencoded;

use crate::error::AuthError;

/// Parameters of the inbound authorization redirect.
///
/// Created per login attempt and discarded after the exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackRequest {
    /// The authorization code.
    pub code: Option<String>,

    /// The opaque state echoed back by the provider.
    pub state: Option<String>,

    /// OAuth `error` parameter, set when the user denied consent or the
    /// provider failed the request.
    pub error: Option<String>,

    /// OAuth `error_description` parameter.
    pub error_description: Option<String>,
}

impl CallbackRequest {
    /// Creates a callback carrying only an authorization code.
    #[must_use]
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    /// Builds a callback from name/value pairs. Unknown names are ignored;
    /// for repeated names the first occurrence wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut callback = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "code" => &mut callback.code,
                "state" => &mut callback.state,
                "error" => &mut callback.error,
                "error_description" => &mut callback.error_description,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        callback
    }

    /// Parses a raw query string (with or without a leading `?`).
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_pairs(form_urlencoded::parse(query.as_bytes()).into_owned())
    }

    /// Parses the query of a full redirect URL.
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        Self::from_pairs(url.query_pairs().into_owned())
    }

    /// Returns the authorization code, or `CallbackRejected` if the provider
    /// signalled an error or sent no code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CallbackRejected` as described above.
    pub fn authorization_code(&self) -> Result<&str, AuthError> {
        if let Some(error) = self.error.as_deref().filter(|e| !e.trim().is_empty()) {
            let reason = match self.error_description.as_deref() {
                Some(description) if !description.is_empty() => {
                    format!("{error} - {description}")
                }
                _ => error.to_string(),
            };
            return Err(AuthError::callback_rejected(reason));
        }

        self.code
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AuthError::callback_rejected("missing authorization code"))
    }
}
