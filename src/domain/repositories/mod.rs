//! Repository trait definitions for the domain layer.
//!
//! - [`Registry`] - Durable short URL storage, the source of truth for statistics
//!
//! Implementations live in `crate::infrastructure::persistence`. A mock is
//! generated via `mockall` for unit tests.

pub mod registry;

pub use registry::Registry;

#[cfg(test)]
pub use registry::MockRegistry;
