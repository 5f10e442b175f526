//! OAuth2/OIDC token core.
//!
//! Provides the signing-key ring with JWKS exposure, the JWT codec,
//! one-time authorization codes with PKCE, token issuance, and refresh
//! rotation with reuse detection.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod authorize;
pub mod config;
pub mod discovery;
pub mod endpoint;
pub mod error;
pub mod issuer;
pub mod jwks;
pub mod jwt;
pub mod keys;
pub mod metrics;
pub mod refresh;
pub mod scope;
pub mod storage;

// Re-exports for convenience
pub use authorize::{AuthorizationCodeEngine, CodeRequest};
pub use config::{Config, JwtAlgorithm};
pub use endpoint::TokenEndpoint;
pub use error::TokenError;
pub use issuer::{IssueRequest, TokenIssuer, TokenPolicy, TokenSet};
pub use jwt::TokenCodec;
pub use keys::KeyRing;
pub use refresh::RefreshRotationEngine;
pub use storage::MemoryStore;
