#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use snip::api::routes::routes;
use snip::application::services::{DeleteAllPolicy, LinkSettings};
use snip::domain::entities::{ExpiredEntry, NewShortUrl, ServiceStats, ShortUrl};
use snip::domain::redirect_counter::{CounterOptions, CounterStrategy, RedirectCounter};
use snip::domain::repositories::Registry;
use snip::error::AppError;
use snip::infrastructure::cache::{CacheService, MemoryCache};
use snip::infrastructure::persistence::MemoryRegistry;
use snip::state::AppState;
use std::collections::HashSet;
use std::sync::Arc;

pub const BASE_URL: &str = "http://sho.rt";
pub const TOKEN_LENGTH: usize = 8;

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub registry: Arc<MemoryRegistry>,
    pub cache: Arc<MemoryCache>,
}

pub fn create_test_state(
    registry: Arc<dyn Registry>,
    cache: Arc<dyn CacheService>,
    strategy: CounterStrategy,
    policy: DeleteAllPolicy,
) -> AppState {
    let (counter, _worker) = RedirectCounter::spawn(
        registry.clone(),
        CounterOptions {
            strategy,
            queue_capacity: 1_000,
            concurrency: 16,
        },
    );

    AppState::new(
        registry,
        cache,
        counter,
        LinkSettings {
            base_url: BASE_URL.to_string(),
            token_length: TOKEN_LENGTH,
            token_max_attempts: 5,
        },
        policy,
    )
}

pub fn create_test_server(state: AppState) -> TestServer {
    TestServer::new(routes().with_state(state)).unwrap()
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(CounterStrategy::Atomic, DeleteAllPolicy::BestEffort)
}

pub fn spawn_app_with(strategy: CounterStrategy, policy: DeleteAllPolicy) -> TestApp {
    let registry = Arc::new(MemoryRegistry::new());
    let cache = Arc::new(MemoryCache::new());
    let state = create_test_state(registry.clone(), cache.clone(), strategy, policy);

    TestApp {
        server: create_test_server(state.clone()),
        state,
        registry,
        cache,
    }
}

/// Registers `url` through the API and returns the response body.
pub async fn register(server: &TestServer, url: &str, ttl: &str) -> Value {
    let response = server.post("/").json(&json!({ "url": url, "ttl": ttl })).await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()
}

pub fn token_of(body: &Value) -> String {
    body["token"].as_str().unwrap().to_string()
}

/// Inserts a record into the registry only, leaving the cache untouched.
pub async fn seed_registry_only(
    registry: &MemoryRegistry,
    token: &str,
    url: &str,
    expiration: DateTime<Utc>,
) {
    registry
        .create(NewShortUrl::new(
            token.to_string(),
            url.to_string(),
            BASE_URL,
            expiration,
        ))
        .await
        .unwrap();
}

/// Registry wrapper that fails selected operations.
pub struct FaultyRegistry {
    pub inner: MemoryRegistry,
    pub failing_deletes: HashSet<String>,
    pub fail_delete_all: bool,
    pub unreachable: bool,
}

impl FaultyRegistry {
    pub fn new() -> Self {
        Self {
            inner: MemoryRegistry::new(),
            failing_deletes: HashSet::new(),
            fail_delete_all: false,
            unreachable: false,
        }
    }

    fn storage_error() -> AppError {
        AppError::storage("Database error", json!({ "reason": "injected" }))
    }
}

#[async_trait]
impl Registry for FaultyRegistry {
    async fn create(&self, new_url: NewShortUrl) -> Result<ShortUrl, AppError> {
        self.inner.create(new_url).await
    }

    async fn get(&self, token: &str) -> Result<ShortUrl, AppError> {
        self.inner.get(token).await
    }

    async fn update(&self, record: &ShortUrl) -> Result<(), AppError> {
        self.inner.update(record).await
    }

    async fn increment_redirects(&self, token: &str) -> Result<i64, AppError> {
        self.inner.increment_redirects(token).await
    }

    async fn delete(&self, token: &str) -> Result<(), AppError> {
        if self.failing_deletes.contains(token) {
            return Err(Self::storage_error());
        }
        self.inner.delete(token).await
    }

    async fn delete_all(&self) -> Result<Vec<String>, AppError> {
        if self.fail_delete_all {
            return Err(Self::storage_error());
        }
        self.inner.delete_all().await
    }

    async fn list_tokens(&self) -> Result<Vec<String>, AppError> {
        self.inner.list_tokens().await
    }

    async fn list_expired(
        &self,
        now: DateTime<Utc>,
        after: Option<ExpiredEntry>,
        limit: i64,
    ) -> Result<Vec<ExpiredEntry>, AppError> {
        self.inner.list_expired(now, after, limit).await
    }

    async fn aggregate_stats(&self) -> Result<ServiceStats, AppError> {
        self.inner.aggregate_stats().await
    }

    async fn ping(&self) -> bool {
        !self.unreachable
    }
}
