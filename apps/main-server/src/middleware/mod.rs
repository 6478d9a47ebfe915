//! Request middleware.

pub mod auth;

pub use auth::{Principal, RequestContext, session_middleware};
