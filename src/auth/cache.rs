use std::time::Duration;

use moka::future::Cache;

use crate::auth::jwt::Token;
use crate::models::User;

/// What a successful authentication resolves to; cached as a unit so a
/// cache hit needs no further DB lookup.
#[derive(Debug, Clone)]
pub struct CachedAuth {
    pub token: Token,
    pub user: User,
}

/// Process-local TTL map keyed by the *raw* bearer token string (not by
/// user id — invalidation is TTL-only; a password change doesn't evict an
/// already-cached token until it expires).
#[derive(Clone)]
pub struct TokenCache {
    inner: Cache<String, CachedAuth>,
}

impl TokenCache {
    pub fn new(ttl_seconds: u64) -> Self {
        let inner = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_seconds))
            .build();
        TokenCache { inner }
    }

    pub async fn get(&self, bearer_token: &str) -> Option<CachedAuth> {
        self.inner.get(bearer_token).await
    }

    pub async fn insert(&self, bearer_token: String, auth: CachedAuth) {
        self.inner.insert(bearer_token, auth).await;
    }
}
