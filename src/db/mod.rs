//! Connection pool setup.

pub mod migrations;

use std::time::Duration;

use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;

use crate::config::DatabasePools;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Builds the r2d2 pool used by the I/O core, the job worker, and the
/// scheduler, each acquiring their own connections from it.
pub fn establish_pool(config: &DatabasePools) -> anyhow::Result<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(&config.url);

    let pool = Pool::builder()
        .min_idle(Some(config.min_size))
        .max_size(config.max_size)
        .idle_timeout(Some(Duration::from_secs(config.max_idle_timeout)))
        .connection_timeout(Duration::from_secs(config.acquire_conn_timeout))
        .build(manager)?;

    Ok(pool)
}

/// Runs a blocking Diesel closure on the blocking thread pool and acquires
/// its own connection from `pool` — a scoped connection checkout with
/// guaranteed release, for every unit of work. Controllers and the
/// `AuthCheck` extractor both use this
/// instead of holding a connection across an `.await` point.
pub async fn run<F, R>(pool: &PgPool, f: F) -> crate::errors::AppResult<R>
where
    F: FnOnce(&mut PgConnection) -> diesel::QueryResult<R> + Send + 'static,
    R: Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> crate::errors::AppResult<R> {
        let mut conn = pool.get().map_err(|e| crate::errors::AppError::Internal(e.into()))?;
        f(&mut conn).map_err(crate::errors::AppError::from)
    })
    .await
    .map_err(|e| crate::errors::AppError::Internal(e.into()))?
}
