//! Application state management

use crate::auth::{AccessGuard, AuthService, JwtConfig, PasswordConfig};
use blog_core::{AppConfig, CommentStore, EnrichedQueries, PostStore, UserStore};
use blog_store::MemoryStore;
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn PostStore>,
    pub comments: Arc<dyn CommentStore>,
    /// Token validation and identity resolution for protected routes
    pub guard: AccessGuard,
    pub auth: AuthService,
    /// Author-joined read queries
    pub queries: EnrichedQueries,
    /// Name of the backing store, reported by the health endpoint
    pub store_kind: &'static str,
}

impl AppState {
    /// Create state over a store implementing every collection
    pub fn new<S>(config: AppConfig, store: Arc<S>, store_kind: &'static str) -> Self
    where
        S: UserStore + PostStore + CommentStore + 'static,
    {
        let users: Arc<dyn UserStore> = store.clone();
        let posts: Arc<dyn PostStore> = store.clone();
        let comments: Arc<dyn CommentStore> = store;

        let jwt = JwtConfig::from(&config.auth);
        let password = PasswordConfig::from(&config.auth);

        Self {
            guard: AccessGuard::new(jwt.clone(), users.clone()),
            auth: AuthService::new(users.clone(), jwt, password),
            queries: EnrichedQueries::new(posts.clone(), comments.clone()),
            users,
            posts,
            comments,
            config,
            start_time: Instant::now(),
            store_kind,
        }
    }

    /// Create state backed by a fresh in-memory store
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()), "memory")
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
