//! Refresh tokens: opaque secrets, issuance records and rotation.

pub mod generator;
pub mod record;
pub mod rotator;

pub use generator::RefreshTokenGenerator;
pub use record::TokenRecord;
pub use rotator::RefreshRotationEngine;
