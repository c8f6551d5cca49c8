//! Registry implementations.
//!
//! - [`PgRegistry`] - PostgreSQL storage via SQLx
//! - [`MemoryRegistry`] - In-process storage for tests and database-less runs

pub mod memory_registry;
pub mod pg_registry;

pub use memory_registry::MemoryRegistry;
pub use pg_registry::PgRegistry;
