//! Process start/shutdown lifecycle hooks.
//!
//! Ambient singletons (the pool, the token cache) are built once here and
//! torn down once at shutdown, rather than lazily per-request.

use tracing::info;

use crate::app::AppState;
use crate::auth::password::generate_salt_and_hashed_password;
use crate::config::Server;
use crate::db;
use crate::models::{NewUser, Role};
use crate::store;

/// Establishes the connection pool, runs pending migrations, bootstraps
/// the default admin user if configured, and returns the ready-to-serve
/// [`AppState`].
pub async fn setup(config: Server) -> anyhow::Result<AppState> {
    let pool = db::establish_pool(&config.db)?;

    {
        let mut conn = pool.get()?;
        db::migrations::run_migrations(&mut conn)?;
    }

    if let (Some(login), Some(password)) = (&config.default_admin_user, &config.default_admin_user_password) {
        bootstrap_default_admin(&pool, login, password)?;
    }

    Ok(AppState::new(config, pool))
}

fn bootstrap_default_admin(
    pool: &db::PgPool,
    login: &str,
    password: &secrecy::Secret<String>,
) -> anyhow::Result<()> {
    use secrecy::ExposeSecret;

    let mut conn = pool.get()?;
    if store::find_user_by_login(&mut conn, login)?.is_some() {
        return Ok(());
    }

    let (salt, hashed_password) = generate_salt_and_hashed_password(password.expose_secret())
        .map_err(|e| anyhow::anyhow!("failed to hash default admin password: {e}"))?;

    let new_user = NewUser {
        id: uuid::Uuid::new_v4(),
        login: login.to_string(),
        salt,
        hashed_password,
        role: Role::Superuser,
    };

    store::insert_user(&mut conn, &new_user)?;
    info!(login, "bootstrapped default admin user");
    Ok(())
}

/// Cooperative shutdown: stop accepting new background work and let
/// in-flight pool operations drain up to `close_timeout` before the
/// process exits. Pool close timeouts firing during shutdown are
/// swallowed rather than propagated.
pub async fn stop(worker: &crate::jobs::CidrWorker, scheduler: &crate::scheduler::Scheduler) {
    worker.stop();
    scheduler.stop();
    info!("shutdown signal received, background loops will exit at their next iteration boundary");
}
