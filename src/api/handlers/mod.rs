//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod delete;
pub mod health;
pub mod redirect;
pub mod register;
pub mod stats;

pub use delete::{delete_all_handler, delete_handler};
pub use health::health_handler;
pub use redirect::redirect_handler;
pub use register::register_handler;
pub use stats::{service_stats_handler, url_stats_handler};
