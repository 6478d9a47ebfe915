//! Identity provider integration for the travel social backend.
//!
//! This crate provides:
//! - The `IdentityProvider` trait used to validate sessions and look up
//!   identities
//! - An HTTP client for Ory Kratos
//! - An in-memory provider for tests and local runs

mod error;
mod identity;
mod kratos;
mod memory;

pub use error::*;
pub use identity::*;
pub use kratos::*;
pub use memory::*;

/// Name of the cookie carrying the Kratos session token.
pub const SESSION_COOKIE_NAME: &str = "ory_kratos_session";

/// Identity trait holding the user's email address.
pub const EMAIL_TRAIT: &str = "email";
