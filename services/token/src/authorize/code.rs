use crate::authorize::pkce::PkceMethod;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Stored authorization code.
///
/// Transitions `used = false -> true` exactly once; expiry is derived from
/// `expires_at`, never stored as a state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationCode {
    pub code: String,
    pub client_id: String,
    pub user_id: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<PkceMethod>,
    pub nonce: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl AuthorizationCode {
    /// Random code value with 256 bits of entropy, base64url encoded.
    pub fn generate_value() -> String {
        let random_bytes: [u8; 32] = rand::thread_rng().gen();
        URL_SAFE_NO_PAD.encode(random_bytes)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the code can be redeemed by this client and redirect URI.
    pub fn is_redeemable_at(&self, now: DateTime<Utc>, client_id: &str, redirect_uri: &str) -> bool {
        !self.used
            && !self.is_expired_at(now)
            && self.client_id == client_id
            && self.redirect_uri == redirect_uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(now: DateTime<Utc>) -> AuthorizationCode {
        AuthorizationCode {
            code: AuthorizationCode::generate_value(),
            client_id: "c1".to_string(),
            user_id: "u1".to_string(),
            redirect_uri: "https://a/cb".to_string(),
            scopes: vec!["openid".to_string()],
            code_challenge: None,
            code_challenge_method: None,
            nonce: None,
            expires_at: now + Duration::minutes(5),
            used: false,
            created_at: now,
        }
    }

    #[test]
    fn test_generated_values_are_unique() {
        let a = AuthorizationCode::generate_value();
        let b = AuthorizationCode::generate_value();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
    }

    #[test]
    fn test_redeemable_predicate() {
        let now = Utc::now();
        let code = sample(now);

        assert!(code.is_redeemable_at(now, "c1", "https://a/cb"));
        assert!(!code.is_redeemable_at(now, "c2", "https://a/cb"));
        assert!(!code.is_redeemable_at(now, "c1", "https://a/other"));
        assert!(!code.is_redeemable_at(now + Duration::minutes(5), "c1", "https://a/cb"));

        let used = AuthorizationCode { used: true, ..code };
        assert!(!used.is_redeemable_at(now, "c1", "https://a/cb"));
    }
}
