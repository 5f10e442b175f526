//! Error taxonomy for the token core.
//!
//! Every failure is resolved into a typed [`TokenError`]. The wire mapping
//! (`error_code`, `public_description`, `http_status`) never includes the
//! internal detail carried by a variant.

use rust_common::PlatformError;
use thiserror::Error;

/// Errors returned by every core operation.
#[derive(Error, Debug)]
pub enum TokenError {
    /// Malformed or missing required parameter.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Client is unknown or does not match the grant.
    #[error("Invalid client: {0}")]
    InvalidClient(String),

    /// Client referenced by a token record no longer resolves.
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    /// Redirect URI is not registered for the client.
    #[error("Redirect URI not registered for client {0}")]
    InvalidRedirectUri(String),

    /// Requested scope exceeds the client's registration.
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    /// Code or refresh grant is unknown, used, expired, revoked or mismatched.
    #[error("Invalid grant: {0}")]
    InvalidGrant(String),

    /// An already-rotated refresh token was presented again.
    #[error("Refresh token reused - chain revoked")]
    ReuseDetected,

    /// Refresh token lifetime elapsed.
    #[error("Refresh token expired")]
    RefreshExpired,

    /// Grant type is not supported by the token endpoint.
    #[error("Unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    /// PKCE method other than `S256` or (allowed) `plain`.
    #[error("Unsupported PKCE method: {0}")]
    UnsupportedPkceMethod(String),

    /// Bearer token failed structural, signature, algorithm or expiry checks.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// No key in the ring carries the requested kid.
    #[error("Unknown signing key: {0}")]
    UnknownKey(String),

    /// The key ring was never initialized.
    #[error("No active signing key")]
    NoActiveKey,

    /// Store, crypto or configuration failure.
    #[error("Server error: {0}")]
    ServerError(String),
}

impl TokenError {
    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create an invalid grant error.
    #[must_use]
    pub fn invalid_grant(msg: impl Into<String>) -> Self {
        Self::InvalidGrant(msg.into())
    }

    /// Create an invalid token error.
    #[must_use]
    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::InvalidToken(msg.into())
    }

    /// Create a server error.
    #[must_use]
    pub fn server(msg: impl Into<String>) -> Self {
        Self::ServerError(msg.into())
    }

    /// Create a configuration error (surfaced as a server error).
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ServerError(format!("configuration: {}", msg.into()))
    }

    /// Fixed RFC 6749 error code for the wire.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidRedirectUri(_)
            | Self::UnsupportedPkceMethod(_) => INVALID_REQUEST,
            Self::InvalidClient(_) | Self::ClientNotFound(_) => INVALID_CLIENT,
            Self::InvalidScope(_) => INVALID_SCOPE,
            Self::InvalidGrant(_) | Self::ReuseDetected | Self::RefreshExpired => INVALID_GRANT,
            Self::UnsupportedGrantType(_) => UNSUPPORTED_GRANT_TYPE,
            Self::InvalidToken(_) => INVALID_TOKEN,
            Self::UnknownKey(_) | Self::NoActiveKey | Self::ServerError(_) => SERVER_ERROR,
        }
    }

    /// Sanitized description safe to return to clients.
    #[must_use]
    pub const fn public_description(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "The request is missing a required parameter or is malformed",
            Self::InvalidRedirectUri(_) => "The redirect_uri is not registered for this client",
            Self::UnsupportedPkceMethod(_) => "Unsupported code_challenge_method",
            Self::InvalidClient(_) | Self::ClientNotFound(_) => "Client authentication failed",
            Self::InvalidScope(_) => "The requested scope is invalid or exceeds the registration",
            Self::InvalidGrant(_) | Self::ReuseDetected | Self::RefreshExpired => {
                "The provided grant is invalid, expired, or revoked"
            }
            Self::UnsupportedGrantType(_) => "Grant type not supported",
            Self::InvalidToken(_) => "The access token is invalid or expired",
            Self::UnknownKey(_) | Self::NoActiveKey | Self::ServerError(_) => {
                "The server encountered an unexpected condition"
            }
        }
    }

    /// HTTP status the transport layer should use.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidClient(_) | Self::ClientNotFound(_) | Self::InvalidToken(_) => 401,
            Self::UnknownKey(_) | Self::NoActiveKey | Self::ServerError(_) => 500,
            _ => 400,
        }
    }

    /// Only server errors may be retried with the identical request.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ServerError(_))
    }
}

impl From<PlatformError> for TokenError {
    fn from(err: PlatformError) -> Self {
        Self::ServerError(format!("store: {err}"))
    }
}

/// `invalid_request`
pub const INVALID_REQUEST: &str = "invalid_request";
/// `invalid_client`
pub const INVALID_CLIENT: &str = "invalid_client";
/// `invalid_grant`
pub const INVALID_GRANT: &str = "invalid_grant";
/// `invalid_scope`
pub const INVALID_SCOPE: &str = "invalid_scope";
/// `unsupported_grant_type`
pub const UNSUPPORTED_GRANT_TYPE: &str = "unsupported_grant_type";
/// `invalid_token`
pub const INVALID_TOKEN: &str = "invalid_token";
/// `server_error`
pub const SERVER_ERROR: &str = "server_error";
