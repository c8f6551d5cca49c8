//! Domain layer containing business entities and background processes.
//!
//! # Architecture
//!
//! - [`entities`] - Short URL record and aggregate statistics
//! - [`repositories`] - The [`repositories::Registry`] contract
//! - [`redirect_counter`] - Queue and worker that count redirects
//! - [`expiration_sweeper`] - Periodic removal of expired records
//!
//! # Redirect Counting Flow
//!
//! 1. The redirect handler resolves the token from the cache
//! 2. [`redirect_counter::RedirectCounter::record`] enqueues a job and returns
//! 3. The worker applies the increment through the registry
//!
//! The domain layer does not depend on the HTTP layer. It reaches storage only
//! through the registry and cache traits.

pub mod entities;
pub mod expiration_sweeper;
pub mod redirect_counter;
pub mod repositories;
