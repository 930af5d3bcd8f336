//! # cinesync-auth
//!
//! Verification of bearer tokens issued by the external identity service.
//! CineSync never issues production tokens itself — the encoder exists for
//! the issuer's contract tests and local development.

pub mod jwt;

pub use jwt::claims::Claims;
pub use jwt::encoder::TokenEncoder;
pub use jwt::verifier::TokenVerifier;
