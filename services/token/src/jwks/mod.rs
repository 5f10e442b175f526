//! Public key set exposure (RFC 7517).

pub mod set;

pub use set::{Jwk, Jwks};
