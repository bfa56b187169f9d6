//! Authentication primitives.
//!
//! - [`password`] -- bcrypt hashing and verification.
//! - [`jwt`] -- bearer token issue and validation.
//! - [`middleware`] -- path allow-list guard and the [`AuthUser`] extractor.

pub mod jwt;
pub mod middleware;
pub mod password;

pub use middleware::AuthUser;
