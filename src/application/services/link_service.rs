//! Registration, lookup and deletion of short URLs.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, warn};

use crate::domain::entities::{NewShortUrl, ShortUrl};
use crate::domain::repositories::Registry;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::token_generator::generate_token;
use crate::utils::ttl::parse_ttl;

/// How `DELETE /` treats per-token failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteAllPolicy {
    /// Delete token by token; failures are logged and skipped.
    #[default]
    BestEffort,
    /// Delete every record in one atomic registry call or none at all.
    AllOrNothing,
}

impl FromStr for DeleteAllPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best_effort" | "best-effort" => Ok(Self::BestEffort),
            "all_or_nothing" | "all-or-nothing" => Ok(Self::AllOrNothing),
            other => Err(format!(
                "unknown delete-all policy '{}', expected 'best_effort' or 'all_or_nothing'",
                other
            )),
        }
    }
}

/// Outcome of a delete-all request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteAllReport {
    pub deleted: usize,
    pub failed: usize,
}

/// Settings for token generation and `shortenedURL` construction.
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub base_url: String,
    pub token_length: usize,
    pub token_max_attempts: usize,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            token_length: 8,
            token_max_attempts: 5,
        }
    }
}

/// Service coordinating the registry and the cache for short URL lifecycles.
///
/// Registration writes the registry first and the cache second. Deletion
/// removes the record from the registry and then invalidates the cache entry;
/// an invalidation failure is logged, not returned.
pub struct LinkService {
    registry: Arc<dyn Registry>,
    cache: Arc<dyn CacheService>,
    settings: LinkSettings,
}

impl LinkService {
    /// Creates a new link service.
    pub fn new(
        registry: Arc<dyn Registry>,
        cache: Arc<dyn CacheService>,
        settings: LinkSettings,
    ) -> Self {
        Self {
            registry,
            cache,
            settings,
        }
    }

    /// Registers `url` under a fresh token that expires `ttl` from now.
    ///
    /// # Token Collisions
    ///
    /// The token is generated and inserted in one step. On a uniqueness
    /// conflict a new token is drawn, up to `token_max_attempts` times.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL is not absolute or the TTL
    /// cannot be parsed; nothing is written in that case.
    /// Returns [`AppError::Internal`] if every token attempt collided or the
    /// entropy source failed.
    /// Returns [`AppError::Storage`] if the registry or the cache write fails.
    /// A cache failure leaves the record in the registry.
    pub async fn register(&self, url: &str, ttl: &str) -> Result<ShortUrl, AppError> {
        // Only the check is done with the parsed form; the caller's string is stored.
        url::Url::parse(url).map_err(|e| {
            AppError::bad_request(
                "Invalid URL",
                json!({ "url": url, "reason": e.to_string() }),
            )
        })?;

        let ttl = parse_ttl(ttl).map_err(|e| {
            AppError::bad_request("Invalid TTL", json!({ "ttl": ttl, "reason": e.to_string() }))
        })?;
        let ttl_out_of_range =
            || AppError::bad_request("TTL is out of range", json!({ "ttl_ms": ttl.as_millis() as u64 }));
        let lifetime = chrono::Duration::from_std(ttl).map_err(|_| ttl_out_of_range())?;
        let expiration = Utc::now()
            .checked_add_signed(lifetime)
            .ok_or_else(ttl_out_of_range)?;

        let retries = FixedInterval::new(Duration::ZERO)
            .take(self.settings.token_max_attempts.saturating_sub(1));

        let record = RetryIf::spawn(
            retries,
            || self.insert_with_fresh_token(url, expiration),
            |e: &AppError| {
                let collided = matches!(e, AppError::Conflict { .. });
                if collided {
                    debug!("Token collision, retrying with a new token");
                }
                collided
            },
        )
        .await
        .map_err(|e| match e {
            AppError::Conflict { .. } => AppError::internal(
                "Failed to generate unique token",
                json!({ "attempts": self.settings.token_max_attempts }),
            ),
            other => other,
        })?;

        // The cache entry must not outlive the record, so count from now.
        let remaining = (record.expiration - Utc::now()).to_std().unwrap_or_default();
        self.cache.set_url(&record.token, &record.url, remaining).await?;

        Ok(record)
    }

    async fn insert_with_fresh_token(
        &self,
        url: &str,
        expiration: chrono::DateTime<Utc>,
    ) -> Result<ShortUrl, AppError> {
        let token = generate_token(self.settings.token_length)?;
        let new_url = NewShortUrl::new(token, url.to_string(), &self.settings.base_url, expiration);
        self.registry.create(new_url).await
    }

    /// Returns the full record for `token`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no record exists.
    pub async fn get(&self, token: &str) -> Result<ShortUrl, AppError> {
        self.registry.get(token).await
    }

    /// Deletes one record and its cache entry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no record exists.
    /// Returns [`AppError::Storage`] if the registry delete fails.
    pub async fn delete(&self, token: &str) -> Result<(), AppError> {
        self.registry.delete(token).await?;
        self.invalidate(token).await;
        Ok(())
    }

    /// Deletes every record according to `policy`.
    ///
    /// # Errors
    ///
    /// With [`DeleteAllPolicy::BestEffort`] only a failure to list tokens is
    /// returned. With [`DeleteAllPolicy::AllOrNothing`] any registry failure
    /// is returned and nothing is deleted.
    pub async fn delete_all(&self, policy: DeleteAllPolicy) -> Result<DeleteAllReport, AppError> {
        let mut report = DeleteAllReport::default();

        match policy {
            DeleteAllPolicy::BestEffort => {
                for token in self.registry.list_tokens().await? {
                    match self.registry.delete(&token).await {
                        Ok(()) => {
                            report.deleted += 1;
                            self.invalidate(&token).await;
                        }
                        Err(AppError::NotFound { .. }) => {}
                        Err(e) => {
                            warn!(token = %token, error = %e, "Failed to delete short URL");
                            report.failed += 1;
                        }
                    }
                }
            }
            DeleteAllPolicy::AllOrNothing => {
                let tokens = self.registry.delete_all().await?;
                report.deleted = tokens.len();
                for token in &tokens {
                    self.invalidate(token).await;
                }
            }
        }

        Ok(report)
    }

    async fn invalidate(&self, token: &str) {
        if let Err(e) = self.cache.invalidate(token).await {
            warn!(token = %token, error = %e, "Failed to invalidate cache entry");
        }
    }
}
