//! Helpers shared across layers.
//!
//! - [`token_generator`] - Random short token generation
//! - [`ttl`] - Parsing of TTL expressions like `10m`
//! - [`timeout`] - Deadlines for registry calls

pub mod timeout;
pub mod token_generator;
pub mod ttl;
