//! Shared proptest generators for OAuth2/OIDC request parameters.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use proptest::prelude::*;
use sha2::{Digest, Sha256};

/// Characters allowed in a PKCE code verifier (RFC 7636 unreserved set).
const VERIFIER_CHARSET: &str = "[A-Za-z0-9._~-]";

/// Generate public client identifiers.
pub fn client_id_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{2,24}"
}

/// Generate user identifiers.
pub fn user_id_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{8,32}"
}

/// Generate https redirect URIs.
pub fn redirect_uri_strategy() -> impl Strategy<Value = String> {
    ("[a-z]{3,12}", "[a-z]{1,10}")
        .prop_map(|(host, path)| format!("https://{host}.example.com/{path}"))
}

/// Generate RFC 7636 compliant code verifiers (43..=128 characters).
pub fn pkce_verifier_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex(&format!("{VERIFIER_CHARSET}{{43,128}}"))
        .expect("verifier regex is valid")
}

/// Generate space-delimited scope strings drawn from the standard OIDC scopes.
pub fn scope_strategy() -> impl Strategy<Value = String> {
    prop::sample::subsequence(vec!["openid", "profile", "email", "offline_access"], 1..=4)
        .prop_map(|scopes| scopes.join(" "))
}

/// Compute the S256 challenge for a verifier, for use in expectations.
#[must_use]
pub fn s256_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}
