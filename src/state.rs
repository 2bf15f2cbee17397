use crate::api::ApiClient;
use crate::cache::QueryCache;
use crate::config::AppConfig;
use crate::session::SessionStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub api: ApiClient,
    pub sessions: SessionStore,
    pub cache: QueryCache,
}

impl AppState {
    pub fn new(config: AppConfig, api: ApiClient, sessions: SessionStore) -> Self {
        Self {
            cache: QueryCache::new(config.stale_time),
            config: Arc::new(config),
            api,
            sessions,
        }
    }

    /// Cache key scoped to one browser session.
    pub fn cache_key(session_id: &str, parts: &[&str]) -> String {
        let mut key = vec![session_id];
        key.extend_from_slice(parts);
        QueryCache::key(&key)
    }

    /// Forgets everything cached for a session.
    pub async fn forget_session(&self, session_id: &str) {
        self.cache.invalidate_prefix(&format!("{session_id}/")).await;
    }
}
