//! PostgreSQL implementation of the registry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::entities::{ExpiredEntry, NewShortUrl, ServiceStats, ShortUrl};
use crate::domain::repositories::Registry;
use crate::error::AppError;
use crate::utils::timeout::bounded;

const RECORD_COLUMNS: &str = "token, url, shortened_url, expiration, redirects";

/// PostgreSQL registry backed by the `short_urls` table.
///
/// Every call is bounded by the configured I/O timeout.
pub struct PgRegistry {
    pool: Arc<PgPool>,
    io_timeout: Duration,
}

impl PgRegistry {
    /// Creates a new registry with a database connection pool.
    pub fn new(pool: Arc<PgPool>, io_timeout: Duration) -> Self {
        Self { pool, io_timeout }
    }
}

fn not_found(token: &str) -> AppError {
    AppError::not_found("Short URL not found", json!({ "token": token }))
}

#[async_trait]
impl Registry for PgRegistry {
    async fn create(&self, new_url: NewShortUrl) -> Result<ShortUrl, AppError> {
        bounded(self.io_timeout, "create", async {
            let sql = format!(
                "INSERT INTO short_urls (token, url, shortened_url, expiration) \
                 VALUES ($1, $2, $3, $4) RETURNING {RECORD_COLUMNS}"
            );
            let record = sqlx::query_as::<_, ShortUrl>(&sql)
                .bind(&new_url.token)
                .bind(&new_url.url)
                .bind(&new_url.shortened_url)
                .bind(new_url.expiration)
                .fetch_one(self.pool.as_ref())
                .await?;
            Ok::<_, AppError>(record)
        })
        .await
    }

    async fn get(&self, token: &str) -> Result<ShortUrl, AppError> {
        bounded(self.io_timeout, "get", async {
            let sql = format!("SELECT {RECORD_COLUMNS} FROM short_urls WHERE token = $1");
            sqlx::query_as::<_, ShortUrl>(&sql)
                .bind(token)
                .fetch_optional(self.pool.as_ref())
                .await?
                .ok_or_else(|| not_found(token))
        })
        .await
    }

    async fn update(&self, record: &ShortUrl) -> Result<(), AppError> {
        bounded(self.io_timeout, "update", async {
            let result = sqlx::query("UPDATE short_urls SET redirects = $2 WHERE token = $1")
                .bind(&record.token)
                .bind(record.redirects)
                .execute(self.pool.as_ref())
                .await?;

            if result.rows_affected() == 0 {
                return Err(not_found(&record.token));
            }
            Ok(())
        })
        .await
    }

    async fn increment_redirects(&self, token: &str) -> Result<i64, AppError> {
        bounded(self.io_timeout, "increment_redirects", async {
            sqlx::query_scalar::<_, i64>(
                "UPDATE short_urls SET redirects = redirects + 1 WHERE token = $1 RETURNING redirects",
            )
            .bind(token)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or_else(|| not_found(token))
        })
        .await
    }

    async fn delete(&self, token: &str) -> Result<(), AppError> {
        bounded(self.io_timeout, "delete", async {
            let result = sqlx::query("DELETE FROM short_urls WHERE token = $1")
                .bind(token)
                .execute(self.pool.as_ref())
                .await?;

            if result.rows_affected() == 0 {
                return Err(not_found(token));
            }
            Ok(())
        })
        .await
    }

    async fn delete_all(&self) -> Result<Vec<String>, AppError> {
        bounded(self.io_timeout, "delete_all", async {
            let tokens = sqlx::query_scalar::<_, String>("DELETE FROM short_urls RETURNING token")
                .fetch_all(self.pool.as_ref())
                .await?;
            Ok::<_, AppError>(tokens)
        })
        .await
    }

    async fn list_tokens(&self) -> Result<Vec<String>, AppError> {
        bounded(self.io_timeout, "list_tokens", async {
            let tokens = sqlx::query_scalar::<_, String>("SELECT token FROM short_urls ORDER BY id")
                .fetch_all(self.pool.as_ref())
                .await?;
            Ok::<_, AppError>(tokens)
        })
        .await
    }

    async fn list_expired(
        &self,
        now: DateTime<Utc>,
        after: Option<ExpiredEntry>,
        limit: i64,
    ) -> Result<Vec<ExpiredEntry>, AppError> {
        let (after_expiration, after_token) = after
            .map(|cursor| (cursor.expiration, cursor.token))
            .unzip();

        bounded(self.io_timeout, "list_expired", async {
            let entries = sqlx::query_as::<_, ExpiredEntry>(
                r#"
                SELECT expiration, token
                FROM short_urls
                WHERE expiration <= $1
                  AND ($2::timestamptz IS NULL OR (expiration, token) > ($2, $3::text))
                ORDER BY expiration, token
                LIMIT $4
                "#,
            )
            .bind(now)
            .bind(after_expiration)
            .bind(after_token)
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;
            Ok::<_, AppError>(entries)
        })
        .await
    }

    async fn aggregate_stats(&self) -> Result<ServiceStats, AppError> {
        bounded(self.io_timeout, "aggregate_stats", async {
            let (total_urls, total_redirects) = sqlx::query_as::<_, (i64, i64)>(
                "SELECT COUNT(*)::BIGINT, COALESCE(SUM(redirects), 0)::BIGINT FROM short_urls",
            )
            .fetch_one(self.pool.as_ref())
            .await?;

            Ok::<_, AppError>(ServiceStats {
                total_urls,
                total_redirects,
            })
        })
        .await
    }

    async fn ping(&self) -> bool {
        bounded(self.io_timeout, "ping", async {
            sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
            Ok::<_, AppError>(())
        })
        .await
        .is_ok()
    }
}
