//! One-time authorization codes bound to client, redirect URI and PKCE.

pub mod code;
pub mod engine;
pub mod pkce;

pub use code::AuthorizationCode;
pub use engine::{AuthorizationCodeEngine, CodeRequest};
pub use pkce::PkceMethod;
