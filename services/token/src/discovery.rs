//! OpenID provider metadata.

use crate::authorize::PkceMethod;
use crate::config::JwtAlgorithm;
use serde::{Deserialize, Serialize};

/// Discovery document served at `/.well-known/openid-configuration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    pub revocation_endpoint: String,
    pub jwks_uri: String,
    pub response_types_supported: Vec<String>,
    pub grant_types_supported: Vec<String>,
    pub subject_types_supported: Vec<String>,
    pub scopes_supported: Vec<String>,
    pub token_endpoint_auth_methods_supported: Vec<String>,
    pub id_token_signing_alg_values_supported: Vec<String>,
    pub code_challenge_methods_supported: Vec<String>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

impl DiscoveryDocument {
    /// Metadata for `issuer`, advertising `plain` only when allowed.
    #[must_use]
    pub fn for_issuer(issuer: &str, algorithm: JwtAlgorithm, allow_plain: bool) -> Self {
        let base = issuer.trim_end_matches('/');

        let mut pkce_methods = vec![PkceMethod::S256.as_str().to_string()];
        if allow_plain {
            pkce_methods.push(PkceMethod::Plain.as_str().to_string());
        }

        Self {
            issuer: issuer.to_string(),
            authorization_endpoint: format!("{base}/authorize"),
            token_endpoint: format!("{base}/token"),
            userinfo_endpoint: format!("{base}/userinfo"),
            revocation_endpoint: format!("{base}/revoke"),
            jwks_uri: format!("{base}/jwks.json"),
            response_types_supported: strings(&["code"]),
            grant_types_supported: strings(&["authorization_code", "refresh_token"]),
            subject_types_supported: strings(&["public"]),
            scopes_supported: strings(&["openid", "profile", "email"]),
            token_endpoint_auth_methods_supported: strings(&["client_secret_basic", "none"]),
            id_token_signing_alg_values_supported: vec![algorithm.as_str().to_string()],
            code_challenge_methods_supported: pkce_methods,
        }
    }
}
