//! Authentication and temporary URL signing for Swift clients.
//!
//! # Modules
//!
//! - [`authenticator`] - The [`Authenticator`] trait that produces a token and
//!   storage URL, with a pre-issued token implementation and the Swift v1
//!   (`X-Auth-User` / `X-Auth-Key`) protocol
//! - [`error`] - Authentication error types
//! - [`tempurl`] - HMAC signatures for Swift temporary URLs

pub mod authenticator;
pub mod error;
pub mod tempurl;

pub use authenticator::{Authenticator, Credentials, StaticToken, SwauthV1};
pub use error::AuthError;
pub use tempurl::{TempUrlDigest, choose_digest, sign, verify};
