//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence and caching.
//!
//! # Modules
//!
//! - [`cache`] - Cache implementations (Redis and in-memory)
//! - [`persistence`] - Registry implementations (PostgreSQL and in-memory)

pub mod cache;
pub mod persistence;
