use crate::scope::ScopeSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access token claim set.
///
/// Unknown fields are ignored on decode; missing required fields reject
/// the token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    // Standard JWT claims
    pub iss: String,
    pub sub: String,
    pub aud: Vec<String>,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,

    // OAuth claims
    pub scope: String,
    pub client_id: String,

    // OIDC claims
    #[serde(default)]
    pub nonce: String,
}

impl Claims {
    pub fn new(
        issuer: String,
        subject: String,
        audience: Vec<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let iat = issued_at.timestamp();
        Claims {
            iss: issuer,
            sub: subject,
            aud: audience,
            iat,
            exp: iat,
            jti: uuid::Uuid::new_v4().to_string(),
            scope: String::new(),
            client_id: String::new(),
            nonce: String::new(),
        }
    }

    pub fn with_scope(mut self, scope: String) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_client_id(mut self, client_id: String) -> Self {
        self.client_id = client_id;
        self
    }

    pub fn with_nonce(mut self, nonce: String) -> Self {
        self.nonce = nonce;
        self
    }

    /// Copy with `exp = iat + ttl_seconds`.
    pub(crate) fn expiring_after(&self, ttl_seconds: i64) -> Self {
        let mut claims = self.clone();
        claims.exp = claims.iat.saturating_add(ttl_seconds);
        claims
    }

    pub fn scopes(&self) -> ScopeSet {
        ScopeSet::parse(&self.scope)
    }

    pub fn is_expired_at(&self, timestamp: i64) -> bool {
        self.exp <= timestamp
    }
}

/// ID token claim set: access claims plus the access-token hash binding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdTokenClaims {
    #[serde(flatten)]
    pub claims: Claims,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_hash: Option<String>,
}
