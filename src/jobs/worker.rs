use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use diesel::r2d2::{ConnectionManager, Pool};
use diesel::{Connection, PgConnection};
use tracing::{error, instrument, warn};

use crate::jobs;
use crate::store;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Drains the durable job queue on a cooperative poll loop. Each poll
/// dequeues and processes a whole batch inside one transaction — a fatal
/// processor error rolls the entire batch back rather than just the
/// offending job.
pub struct CidrWorker {
    pool: PgPool,
    poll_interval: Duration,
    only_global: bool,
    running: Arc<AtomicBool>,
}

impl CidrWorker {
    pub fn new(pool: PgPool, poll_interval: Duration, only_global: bool) -> Self {
        CidrWorker {
            pool,
            poll_interval,
            only_global,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Sets the cooperative stop flag; the current sleep (if any) still
    /// runs out before `run()` exits.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    #[instrument(name = "cidr_worker", skip(self))]
    pub async fn run(&self) {
        while self.running.load(Ordering::SeqCst) {
            if let Err(err) = self.run_once().await {
                error!(?err, "job batch failed");
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Drains and processes every job visible right now. Exposed
    /// separately so tests can drive the worker deterministically
    /// instead of waiting on the poll loop.
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> anyhow::Result<()> {
        let pool = self.pool.clone();
        let only_global = self.only_global;

        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut conn = pool.get()?;
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                let rows = store::dequeue_batch(conn)?;
                for row in rows {
                    let job = match row.job() {
                        Ok(job) => job,
                        Err(_) => return Err(diesel::result::Error::RollbackTransaction),
                    };

                    if let Err(err) = jobs::process(conn, &job, only_global) {
                        warn!(job_id = %job.job_id, ?err, "job processing failed, rolling back batch");
                        return Err(diesel::result::Error::RollbackTransaction);
                    }
                }
                Ok(())
            })?;
            Ok(())
        })
        .await??;

        Ok(())
    }
}
