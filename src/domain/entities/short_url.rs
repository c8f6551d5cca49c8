//! Short URL record, the central entity of the service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered short URL together with its usage counter.
///
/// Everything except `redirects` is fixed at creation. `redirects` is only
/// ever written by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShortUrl {
    pub token: String,
    pub url: String,
    #[serde(rename = "shortenedURL")]
    pub shortened_url: String,
    pub expiration: DateTime<Utc>,
    pub redirects: i64,
}

impl ShortUrl {
    /// Returns true once `now` has reached the expiration instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration <= now
    }

    /// Returns true if the record has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// A record's position in the expiration order.
///
/// Ordered by `expiration`, then `token`. The sweeper pages through expired
/// records by passing the last entry it saw back to the registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, sqlx::FromRow)]
pub struct ExpiredEntry {
    pub expiration: DateTime<Utc>,
    pub token: String,
}

/// Input data for registering a new short URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShortUrl {
    pub token: String,
    pub url: String,
    pub shortened_url: String,
    pub expiration: DateTime<Utc>,
}

impl NewShortUrl {
    /// Builds the creation payload, deriving `shortened_url` from `hostname`.
    pub fn new(token: String, url: String, hostname: &str, expiration: DateTime<Utc>) -> Self {
        let shortened_url = format!("{}/{}", hostname.trim_end_matches('/'), token);
        Self {
            token,
            url,
            shortened_url,
            expiration,
        }
    }

    /// The record as it exists right after creation.
    pub fn into_record(self) -> ShortUrl {
        ShortUrl {
            token: self.token,
            url: self.url,
            shortened_url: self.shortened_url,
            expiration: self.expiration,
            redirects: 0,
        }
    }
}
