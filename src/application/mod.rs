//! Application layer services implementing business logic.
//!
//! Services coordinate the registry and the cache and are what HTTP handlers
//! and the admin CLI call into.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Registration, lookup and deletion
//! - [`services::stats_service::StatsService`] - Service-wide and per-URL statistics

pub mod services;
