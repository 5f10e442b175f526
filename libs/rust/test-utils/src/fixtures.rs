//! Test fixtures with sample data.
//!
//! Fixtures are plain data so that any crate can turn them into its own
//! domain types without this crate depending on it.

/// Sample client registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleClient {
    /// Public client identifier
    pub client_id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Registered redirect URIs
    pub redirect_uris: &'static [&'static str],
    /// Registered scopes
    pub scopes: &'static [&'static str],
    /// Whether the client can keep a secret
    pub confidential: bool,
    /// Whether PKCE is enforced regardless of client type
    pub pkce_required: bool,
}

/// Sample end-user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleUser {
    /// User identifier
    pub id: &'static str,
    /// Email address
    pub email: &'static str,
    /// Whether the email was verified
    pub email_verified: bool,
}

impl SampleClient {
    /// Public single-page application client using PKCE.
    #[must_use]
    pub const fn public_spa() -> Self {
        Self {
            client_id: "c1",
            name: "Public SPA",
            redirect_uris: &["https://a/cb"],
            scopes: &["openid", "profile", "email", "offline_access"],
            confidential: false,
            pkce_required: true,
        }
    }

    /// Confidential backend client that does not force PKCE.
    #[must_use]
    pub const fn confidential_backend() -> Self {
        Self {
            client_id: "backend",
            name: "Confidential Backend",
            redirect_uris: &["https://backend.example.com/callback", "https://backend.example.com/alt"],
            scopes: &["openid", "profile"],
            confidential: true,
            pkce_required: false,
        }
    }
}

impl SampleUser {
    /// Primary test user.
    #[must_use]
    pub const fn alice() -> Self {
        Self {
            id: "u1",
            email: "alice@example.com",
            email_verified: true,
        }
    }
}

/// RFC 7636 appendix B verifier.
pub const RFC7636_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

/// RFC 7636 appendix B S256 challenge for [`RFC7636_VERIFIER`].
pub const RFC7636_CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";
