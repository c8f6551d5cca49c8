//! Data Transfer Objects for API requests and responses.
//!
//! Records and statistics are serialized straight from the domain entities;
//! only inputs and the health report have their own types.

pub mod health;
pub mod register;
