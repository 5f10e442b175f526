//! Centralized configuration for the token core.
//!
//! All configuration is loaded from environment variables and validated
//! at startup. The tracing configuration from the platform library is
//! included.

use crate::error::TokenError;
use rust_common::TracingConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// JWT signing algorithm used for keys minted by the key ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtAlgorithm {
    /// RSA with SHA-256
    RS256,
    /// RSA-PSS with SHA-256
    PS256,
    /// ECDSA with P-256 and SHA-256
    ES256,
}

impl JwtAlgorithm {
    /// Get algorithm name for JWT header.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RS256 => "RS256",
            Self::PS256 => "PS256",
            Self::ES256 => "ES256",
        }
    }

    /// Equivalent `jsonwebtoken` algorithm.
    #[must_use]
    pub const fn jsonwebtoken(&self) -> jsonwebtoken::Algorithm {
        match self {
            Self::RS256 => jsonwebtoken::Algorithm::RS256,
            Self::PS256 => jsonwebtoken::Algorithm::PS256,
            Self::ES256 => jsonwebtoken::Algorithm::ES256,
        }
    }

    /// JWK `kty` for keys of this algorithm.
    #[must_use]
    pub const fn key_type(&self) -> &'static str {
        match self {
            Self::RS256 | Self::PS256 => "RSA",
            Self::ES256 => "EC",
        }
    }
}

impl FromStr for JwtAlgorithm {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "RS256" => Ok(Self::RS256),
            "PS256" => Ok(Self::PS256),
            "ES256" => Ok(Self::ES256),
            _ => Err(TokenError::config(format!("Invalid JWT algorithm: {s}"))),
        }
    }
}

/// Token core configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // JWT settings
    /// JWT issuer claim
    pub jwt_issuer: String,
    /// JWT signing algorithm
    pub jwt_algorithm: JwtAlgorithm,
    /// Access token TTL
    pub access_token_ttl: Duration,
    /// ID token TTL
    pub id_token_ttl: Duration,
    /// Refresh token TTL
    pub refresh_token_ttl: Duration,
    /// Authorization code TTL
    pub auth_code_ttl: Duration,

    // Key ring settings
    /// Interval after which the active signing key is replaced
    pub key_rotation_period: Duration,
    /// How long retired keys stay published; `None` keeps them indefinitely
    pub retired_key_retention: Option<Duration>,

    // PKCE
    /// Whether the `plain` challenge method is accepted
    pub pkce_allow_plain: bool,
    /// Whether challenges and verifiers must have RFC 7636 length and charset
    pub pkce_strict_format: bool,

    // Platform integration
    /// Tracing configuration
    pub tracing: TracingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jwt_issuer: "http://localhost:8080".to_string(),
            jwt_algorithm: JwtAlgorithm::RS256,
            access_token_ttl: Duration::from_secs(600),
            id_token_ttl: Duration::from_secs(600),
            refresh_token_ttl: Duration::from_secs(86_400),
            auth_code_ttl: Duration::from_secs(300),
            key_rotation_period: Duration::from_secs(900),
            retired_key_retention: None,
            pkce_allow_plain: true,
            pkce_strict_format: false,
            tracing: TracingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, TokenError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_vars<F>(lookup: F) -> Result<Self, TokenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let jwt_issuer = lookup("JWT_ISSUER").unwrap_or(defaults.jwt_issuer);
        let jwt_algorithm = match lookup("JWT_ALGORITHM") {
            Some(value) => value.parse()?,
            None => defaults.jwt_algorithm,
        };

        let access_token_ttl = Duration::from_secs(parse_var(&lookup, "ACCESS_TOKEN_TTL", 600)?);
        let id_token_ttl = Duration::from_secs(parse_var(
            &lookup,
            "ID_TOKEN_TTL",
            access_token_ttl.as_secs(),
        )?);
        let refresh_token_ttl =
            Duration::from_secs(parse_var(&lookup, "REFRESH_TOKEN_TTL", 86_400)?);
        let auth_code_ttl = Duration::from_secs(parse_var(&lookup, "AUTH_CODE_TTL", 300)?);

        let key_rotation_period =
            Duration::from_secs(parse_var(&lookup, "KEY_ROTATION_PERIOD", 900)?);
        let retired_key_retention = match lookup("KEY_RETIRED_RETENTION") {
            Some(raw) => Some(Duration::from_secs(raw.parse().map_err(|e| {
                TokenError::config(format!("Invalid KEY_RETIRED_RETENTION: {e}"))
            })?)),
            None => None,
        };

        let pkce_allow_plain = parse_var(&lookup, "PKCE_ALLOW_PLAIN", true)?;
        let pkce_strict_format = parse_var(&lookup, "PKCE_STRICT_FORMAT", false)?;

        let tracing = TracingConfig::from_vars(&lookup);

        let config = Self {
            jwt_issuer,
            jwt_algorithm,
            access_token_ttl,
            id_token_ttl,
            refresh_token_ttl,
            auth_code_ttl,
            key_rotation_period,
            retired_key_retention,
            pkce_allow_plain,
            pkce_strict_format,
            tracing,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), TokenError> {
        if self.access_token_ttl.is_zero() || self.refresh_token_ttl.is_zero() {
            return Err(TokenError::config("token TTLs must be positive"));
        }
        if self.auth_code_ttl.is_zero() {
            return Err(TokenError::config("AUTH_CODE_TTL must be positive"));
        }
        if self.key_rotation_period.is_zero() {
            return Err(TokenError::config("KEY_ROTATION_PERIOD must be positive"));
        }
        Ok(())
    }
}

/// Convert a configured TTL for timestamp arithmetic, saturating on overflow.
pub(crate) fn chrono_duration(ttl: Duration) -> chrono::Duration {
    chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500))
}

/// Parse a variable with default value.
fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, TokenError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) => val
            .parse()
            .map_err(|e| TokenError::config(format!("Invalid {name}: {e}"))),
        None => Ok(default),
    }
}
