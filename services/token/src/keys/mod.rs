//! Signing key lifecycle.

pub mod material;
pub mod ring;

pub use material::SigningKey;
pub use ring::KeyRing;
