//! Process entry point: loads configuration, establishes the pool, starts
//! the HTTP listener plus the job worker and TTL reaper background tasks,
//! and shuts all three down cooperatively on Ctrl-C.

use std::sync::Arc;

use cidrlist::config::Server;
use cidrlist::jobs::CidrWorker;
use cidrlist::scheduler::Scheduler;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let config = Server::from_environment()?;
    let addr = std::net::SocketAddr::from((config.ip, config.port));
    let only_global = config.only_global_cidrs;
    let job_interval = config.job_queue_query_interval;
    let reaper_interval = config.scheduler_delete_expired_interval;

    let state = cidrlist::boot::setup(config).await?;

    let worker = Arc::new(CidrWorker::new(state.db_pool.clone(), job_interval, only_global));
    let scheduler = Arc::new(Scheduler::new(state.db_pool.clone(), reaper_interval));

    let worker_handle = tokio::spawn({
        let worker = worker.clone();
        async move { worker.run().await }
    });
    let scheduler_handle = tokio::spawn({
        let scheduler = scheduler.clone();
        async move { scheduler.run().await }
    });

    let app = cidrlist::build_handler(state);

    info!(%addr, "listening");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cidrlist::boot::stop(&worker, &scheduler).await;
    let _ = tokio::join!(worker_handle, scheduler_handle);

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
