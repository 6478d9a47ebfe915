//! Profile storage for the travel social backend
//!
//! This crate provides a storage abstraction for users and their travel
//! preferences. It ships a PostgreSQL implementation for deployments and an
//! in-memory implementation for tests and local runs.

mod error;
mod memory;
mod postgres;
mod traits;

pub use error::*;
pub use memory::*;
pub use postgres::*;
pub use traits::*;

/// Maximum number of users returned by a search.
pub const SEARCH_LIMIT: usize = 20;
