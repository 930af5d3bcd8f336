//! JWT claims, verification, and (issuer-side) encoding.

pub mod claims;
pub mod encoder;
pub mod verifier;
