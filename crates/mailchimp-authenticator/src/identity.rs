//! The authenticated-user record handed back to the host.

use std::fmt;

use serde::Serialize;

use crate::claims::{ClaimSet, EMAIL_CLAIM};

/// Result of a successful authorization-code exchange.
///
/// A successful exchange does not guarantee a usable identity: when the
/// provider supplied no `email` claim the subject identifier is empty and
/// [`AuthenticatedIdentity::is_complete`] returns `false`. Hosts must treat
/// that as an incomplete authentication.
#[derive(Clone, Serialize)]
pub struct AuthenticatedIdentity {
    /// Value of the `email` claim, or empty.
    pub subject_identifier: String,

    /// All claims returned by the userinfo endpoint.
    pub claims: ClaimSet,

    /// The provider access token, for hosts that keep it in session state.
    #[serde(skip)]
    pub access_token: String,
}

impl AuthenticatedIdentity {
    /// Builds an identity, taking the subject identifier from the `email`
    /// claim. No other claim is consulted.
    #[must_use]
    pub fn from_claims(claims: ClaimSet, access_token: impl Into<String>) -> Self {
        let subject_identifier = claims.get(EMAIL_CLAIM).unwrap_or_default().to_string();
        Self {
            subject_identifier,
            claims,
            access_token: access_token.into(),
        }
    }

    /// Returns `true` if the subject identifier is non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.subject_identifier.is_empty()
    }
}

impl fmt::Debug for AuthenticatedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedIdentity")
            .field("subject_identifier", &self.subject_identifier)
            .field("claims", &self.claims)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}
