//! Shared state injected into every handler.

use std::sync::Arc;

use crate::application::services::{DeleteAllPolicy, LinkService, LinkSettings, StatsService};
use crate::domain::redirect_counter::RedirectCounter;
use crate::domain::repositories::Registry;
use crate::infrastructure::cache::CacheService;

/// Application state, cloned per request.
///
/// Every field is a cheap handle to a process-wide resource.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<dyn Registry>,
    pub cache: Arc<dyn CacheService>,
    pub link_service: Arc<LinkService>,
    pub stats_service: Arc<StatsService>,
    pub counter: RedirectCounter,
    pub delete_all_policy: DeleteAllPolicy,
}

impl AppState {
    /// Wires the services on top of a registry and a cache.
    pub fn new(
        registry: Arc<dyn Registry>,
        cache: Arc<dyn CacheService>,
        counter: RedirectCounter,
        settings: LinkSettings,
        delete_all_policy: DeleteAllPolicy,
    ) -> Self {
        Self {
            link_service: Arc::new(LinkService::new(registry.clone(), cache.clone(), settings)),
            stats_service: Arc::new(StatsService::new(registry.clone())),
            registry,
            cache,
            counter,
            delete_all_policy,
        }
    }
}
