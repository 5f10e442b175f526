use crate::config::JwtAlgorithm;
use serde::{Deserialize, Serialize};

/// Public portion of a signing key.
///
/// RSA keys carry `n`/`e`, EC keys carry `crv`/`x`/`y`. All numeric
/// components are unpadded base64url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type (`RSA` or `EC`)
    pub kty: String,
    /// Key identifier
    pub kid: String,
    /// Key usage, always `sig`
    #[serde(rename = "use")]
    pub key_use: String,
    /// Algorithm tag
    pub alg: String,
    /// RSA modulus
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA public exponent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    /// EC curve name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// EC x coordinate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// EC y coordinate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl Jwk {
    /// Build an RSA signing JWK for `RS256` or `PS256`.
    #[must_use]
    pub fn rsa(kid: impl Into<String>, algorithm: JwtAlgorithm, n: String, e: String) -> Self {
        Self {
            kty: algorithm.key_type().to_string(),
            kid: kid.into(),
            key_use: "sig".to_string(),
            alg: algorithm.as_str().to_string(),
            n: Some(n),
            e: Some(e),
            crv: None,
            x: None,
            y: None,
        }
    }

    /// Build a P-256 signing JWK.
    #[must_use]
    pub fn ec_p256(kid: impl Into<String>, x: String, y: String) -> Self {
        Self {
            kty: JwtAlgorithm::ES256.key_type().to_string(),
            kid: kid.into(),
            key_use: "sig".to_string(),
            alg: JwtAlgorithm::ES256.as_str().to_string(),
            n: None,
            e: None,
            crv: Some("P-256".to_string()),
            x: Some(x),
            y: Some(y),
        }
    }
}

/// JSON Web Key Set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    /// Published keys, active key first
    pub keys: Vec<Jwk>,
}

impl Jwks {
    /// Create an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Append a key.
    pub fn add_key(&mut self, key: Jwk) {
        self.keys.push(key);
    }

    /// Look up a key by kid.
    #[must_use]
    pub fn find_key(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid == kid)
    }

    /// Serialize to the wire format.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
