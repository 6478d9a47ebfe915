//! Application services.

pub mod profile;

pub use profile::{ProfileService, ServiceError, ServiceResult};
