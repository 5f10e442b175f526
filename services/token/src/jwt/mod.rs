pub mod builder;
pub mod claims;
pub mod codec;

pub use builder::ClaimsBuilder;
pub use claims::{Claims, IdTokenClaims};
pub use codec::{at_hash, TokenCodec};
