//! Core domain entities.
//!
//! - [`ShortUrl`] - A registered short URL and its redirect counter
//! - [`NewShortUrl`] - Creation payload for [`ShortUrl`]
//! - [`ExpiredEntry`] - Paging cursor over expired records
//! - [`ServiceStats`] - Service-wide totals derived from the registry

pub mod short_url;
pub mod stats;

pub use short_url::{ExpiredEntry, NewShortUrl, ShortUrl};
pub use stats::ServiceStats;
