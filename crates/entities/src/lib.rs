//! Core entity definitions for the travel social backend.
//!
//! This crate defines the records owned by the profile store: users and
//! their travel preferences, together with the partial-update inputs used
//! to mutate them.

mod travel;
mod user;

pub use travel::*;
pub use user::*;
