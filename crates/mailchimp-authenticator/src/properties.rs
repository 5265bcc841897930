//! Operator-facing configuration property metadata.
//!
//! Hosts render these in their provider editor and hand the entered values
//! back as a name/value map (see [`crate::ProviderConfig::from_properties`]).

use serde::{Deserialize, Serialize};

/// Internal authenticator name.
pub const AUTHENTICATOR_NAME: &str = "MailChimpAuthenticator";

/// Name shown to end users.
pub const AUTHENTICATOR_FRIENDLY_NAME: &str = "mailChimp";

/// Property name of the OAuth client ID.
pub const CLIENT_ID: &str = "ClientId";

/// Property name of the OAuth client secret.
pub const CLIENT_SECRET: &str = "ClientSecret";

/// Property name of the callback URL.
pub const CALLBACK_URL: &str = "callbackUrl";

/// Property name of the userinfo endpoint.
pub const USERINFO_ENDPOINT: &str = "UserInfoUrl";

/// Metadata for one configurable property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// Key under which the value is stored.
    pub name: String,

    /// Label shown in the editor.
    pub display_name: String,

    /// Help text.
    pub description: String,

    /// Whether the operator must supply a value.
    pub required: bool,

    /// Whether the value must be masked in UIs and logs.
    pub confidential: bool,

    /// Position in the editor, ascending.
    pub display_order: u32,
}

impl Property {
    /// Creates an optional, non-confidential property.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        display_order: u32,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: String::new(),
            required: false,
            confidential: false,
            display_order,
        }
    }

    /// Sets the help text.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Marks the property as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the property as confidential.
    #[must_use]
    pub fn confidential(mut self) -> Self {
        self.confidential = true;
        self
    }
}

/// Returns the four MailChimp properties in display order.
#[must_use]
pub fn configuration_properties() -> Vec<Property> {
    vec![
        Property::new(CLIENT_ID, "Client Id", 0)
            .with_description("Enter mailChimp client identifier value")
            .required(),
        Property::new(CLIENT_SECRET, "Client Secret", 1)
            .with_description("Enter mailChimp client secret value")
            .required()
            .confidential(),
        Property::new(CALLBACK_URL, "Callback URL", 2).with_description("Enter the callback url"),
        Property::new(USERINFO_ENDPOINT, "UserInfo Endpoint", 3)
            .with_description("Enter the userInfo url"),
    ]
}
