//! PKCE (RFC 7636) challenge handling.

use crate::error::TokenError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Minimum length for a code verifier.
pub const MIN_VERIFIER_LENGTH: usize = 43;

/// Maximum length for a code verifier.
pub const MAX_VERIFIER_LENGTH: usize = 128;

/// Length of an S256 challenge (base64url of a SHA-256 digest).
const S256_CHALLENGE_LENGTH: usize = 43;

/// Code challenge method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PkceMethod {
    /// Verifier compared verbatim; discouraged
    #[serde(rename = "plain")]
    Plain,
    /// SHA-256 of the verifier, base64url without padding
    S256,
}

impl PkceMethod {
    /// Parse a `code_challenge_method`. Absent or empty means `plain`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPkceMethod` for any other value.
    pub fn parse(method: Option<&str>) -> Result<Self, TokenError> {
        match method.unwrap_or("") {
            "" | "plain" => Ok(Self::Plain),
            "S256" => Ok(Self::S256),
            other => Err(TokenError::UnsupportedPkceMethod(other.to_string())),
        }
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::S256 => "S256",
        }
    }
}

/// Computes the S256 code challenge from a code verifier.
#[must_use]
pub fn compute_s256_challenge(code_verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes()))
}

fn is_unreserved(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')
}

/// Check verifier length and character set. Applied only under the strict
/// format policy; [`verify`] itself accepts any verifier whose digest matches.
///
/// # Errors
///
/// Returns `InvalidGrant` when the verifier is malformed.
pub fn validate_verifier(code_verifier: &str) -> Result<(), TokenError> {
    let len = code_verifier.len();
    if !(MIN_VERIFIER_LENGTH..=MAX_VERIFIER_LENGTH).contains(&len) {
        return Err(TokenError::invalid_grant(format!(
            "code verifier length {len} outside {MIN_VERIFIER_LENGTH}..={MAX_VERIFIER_LENGTH}"
        )));
    }
    if !code_verifier.chars().all(is_unreserved) {
        return Err(TokenError::invalid_grant(
            "code verifier contains invalid characters",
        ));
    }
    Ok(())
}

/// Check a challenge's shape at issuance under the strict format policy.
///
/// # Errors
///
/// Returns `InvalidRequest` when the challenge cannot have come from a valid verifier.
pub fn validate_challenge(challenge: &str, method: PkceMethod) -> Result<(), TokenError> {
    let valid = match method {
        PkceMethod::S256 => {
            challenge.len() == S256_CHALLENGE_LENGTH
                && challenge
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        }
        PkceMethod::Plain => validate_verifier(challenge).is_ok(),
    };

    if valid {
        Ok(())
    } else {
        Err(TokenError::invalid_request("malformed code_challenge"))
    }
}

/// Whether `code_verifier` satisfies the stored challenge. Constant-time.
#[must_use]
pub fn verify(method: PkceMethod, challenge: &str, code_verifier: &str) -> bool {
    let candidate = match method {
        PkceMethod::S256 => compute_s256_challenge(code_verifier),
        PkceMethod::Plain => code_verifier.to_string(),
    };
    candidate.as_bytes().ct_eq(challenge.as_bytes()).into()
}
