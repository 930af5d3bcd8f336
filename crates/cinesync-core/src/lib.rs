//! # cinesync-core
//!
//! Core crate for CineSync. Contains typed identifiers, configuration
//! schemas, collaborator traits, and the unified error system.
//!
//! This crate has **no** internal dependencies on other CineSync crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
