//! The process-wide application state shared across the I/O core, the job
//! worker, and the scheduler.

use std::sync::Arc;

use crate::auth::TokenCache;
use crate::config::Server;
use crate::db::PgPool;

/// Cloned into every axum handler via `AddExtensionLayer`/`FromRef`; wraps
/// the pool, config, and caches behind one cheap-to-clone handle.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Server>,
    pub db_pool: PgPool,
    pub token_cache: TokenCache,
}

impl AppState {
    pub fn new(config: Server, db_pool: PgPool) -> Self {
        let token_cache = TokenCache::new(config.auth_cache_seconds);
        AppState { config: Arc::new(config), db_pool, token_cache }
    }
}

impl axum::extract::FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.db_pool.clone()
    }
}
