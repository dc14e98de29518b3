//! The periodic background task runner. Currently hosts a single task,
//! the TTL reaper, but is shaped to take more.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;
use tracing::{error, info, instrument};

use crate::store;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Deletes TTL-expired `cidr` rows every `interval` (default 30s).
pub struct Scheduler {
    pool: PgPool,
    interval: Duration,
    running: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(pool: PgPool, interval: Duration) -> Self {
        Scheduler { pool, interval, running: Arc::new(AtomicBool::new(true)) }
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    #[instrument(name = "ttl_reaper", skip(self))]
    pub async fn run(&self) {
        while self.running.load(Ordering::SeqCst) {
            if let Err(err) = self.run_once().await {
                error!(?err, "TTL reaper tick failed");
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One reaper tick, exposed separately so tests can drive it
    /// deterministically instead of waiting on the poll loop.
    pub async fn run_once(&self) -> anyhow::Result<usize> {
        let pool = self.pool.clone();

        let deleted = tokio::task::spawn_blocking(move || -> anyhow::Result<usize> {
            let mut conn = pool.get()?;
            Ok(store::delete_expired(&mut conn)?)
        })
        .await??;

        if deleted > 0 {
            info!(deleted, "reaped expired cidrs");
        }

        Ok(deleted)
    }
}
