use serde::{Deserialize, Serialize};

/// Registered OAuth client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Internal identifier
    pub id: String,
    /// Public client identifier
    pub client_id: String,
    /// Display name
    pub name: String,
    /// Registered redirect URIs, matched exactly
    pub redirect_uris: Vec<String>,
    /// Registered scopes; empty allows any
    pub scopes: Vec<String>,
    /// Whether the client can keep a secret
    pub confidential: bool,
    /// Whether PKCE is enforced regardless of client type
    pub pkce_required: bool,
}

impl Client {
    /// Whether `redirect_uri` is registered.
    #[must_use]
    pub fn allows_redirect(&self, redirect_uri: &str) -> bool {
        self.redirect_uris.iter().any(|uri| uri == redirect_uri)
    }

    /// Public clients and clients flagged `pkce_required` must send a challenge.
    #[must_use]
    pub const fn requires_pkce(&self) -> bool {
        !self.confidential || self.pkce_required
    }
}

/// End-user known to the login collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier, the `sub` claim
    pub id: String,
    /// Email address
    pub email: String,
    /// Whether the email was verified
    pub email_verified: bool,
}
