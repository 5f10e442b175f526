//! Wire types for the token, revocation and userinfo endpoints.

use crate::error::TokenError;
use crate::issuer::TokenSet;
use serde::{Deserialize, Serialize};

/// `authorization_code` grant type.
pub const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";

/// `refresh_token` grant type.
pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";

/// Token endpoint form parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    /// Grant type
    pub grant_type: String,
    /// Authorization code
    pub code: Option<String>,
    /// Redirect URI used in the authorization request
    pub redirect_uri: Option<String>,
    /// Public client identifier
    pub client_id: Option<String>,
    /// PKCE code verifier
    pub code_verifier: Option<String>,
    /// Raw refresh secret
    pub refresh_token: Option<String>,
    /// Opaque client state echoed on errors
    pub state: Option<String>,
}

impl TokenRequest {
    /// Required parameter, `InvalidRequest` when missing or empty.
    pub(crate) fn require<'a>(value: Option<&'a String>, name: &str) -> Result<&'a str, TokenError> {
        value
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| TokenError::invalid_request(format!("{name} is required")))
    }
}

/// Successful token endpoint body.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed access token
    pub access_token: String,
    /// Opaque refresh secret
    pub refresh_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
    /// Granted scope
    pub scope: String,
    /// ID token, authorization code grant only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl From<TokenSet> for TokenResponse {
    fn from(tokens: TokenSet) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: tokens.expires_in,
            scope: tokens.scope,
            id_token: tokens.id_token,
        }
    }
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// OAuth error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: String,
    /// Sanitized description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    /// Client state from the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// HTTP status for the transport layer
    #[serde(skip)]
    pub status: u16,
}

impl ErrorResponse {
    /// Build the wire error for `err`. Internal detail never leaks.
    #[must_use]
    pub fn from_error(err: &TokenError, state: Option<String>) -> Self {
        Self {
            error: err.error_code().to_string(),
            error_description: Some(err.public_description().to_string()),
            state,
            status: err.http_status(),
        }
    }
}

/// OIDC userinfo body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Subject
    pub sub: String,
    /// Email address
    pub email: String,
    /// Whether the email was verified
    pub email_verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_is_sanitized() {
        let err = TokenError::server("redis at 10.0.0.3 refused connection");
        let body = ErrorResponse::from_error(&err, Some("xyz".to_string()));
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["error"], "server_error");
        assert_eq!(json["state"], "xyz");
        assert!(!json["error_description"].as_str().unwrap().contains("10.0.0.3"));
        assert!(json.get("status").is_none());
        assert_eq!(body.status, 500);
    }

    #[test]
    fn test_reuse_looks_like_invalid_grant() {
        let body = ErrorResponse::from_error(&TokenError::ReuseDetected, None);
        let plain = ErrorResponse::from_error(&TokenError::invalid_grant("unknown"), None);
        assert_eq!(body, plain);
        assert!(serde_json::to_value(&body).unwrap().get("state").is_none());
    }

    #[test]
    fn test_response_omits_absent_id_token() {
        let response = TokenResponse {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 600,
            scope: "openid".to_string(),
            id_token: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("id_token").is_none());
        assert_eq!(json["token_type"], "Bearer");
    }

    #[test]
    fn test_require() {
        let present = Some("x".to_string());
        let empty = Some(String::new());
        assert_eq!(TokenRequest::require(present.as_ref(), "code").unwrap(), "x");
        assert!(TokenRequest::require(empty.as_ref(), "code").is_err());
        assert!(TokenRequest::require(None, "code").is_err());
    }
}
