//! Shared test utilities for auth-platform Rust crates.
//!
//! This crate provides:
//! - Proptest generators for OAuth2/OIDC request parameters
//! - Test fixtures with sample client registrations and users

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

pub use generators::*;
