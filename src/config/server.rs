//! Process configuration, loaded once at boot from the environment.
//!
//! A single struct assembled from `cidrlist_env_vars::{var, var_parsed,
//! required_var, required_var_parsed}` calls, with defaults applied via
//! `var_parsed_or`-style fallbacks.

use std::net::IpAddr;
use std::time::Duration;

use cidrlist_env_vars::{required_var, var_parsed, var_parsed_or};
use secrecy::{ExposeSecret, Secret};

use crate::Env;

const DEFAULT_JOB_QUEUE_QUERY_INTERVAL: u64 = 5;
const DEFAULT_SCHEDULER_DELETE_EXPIRED_INTERVAL: u64 = 30;
const DEFAULT_TOKEN_TTL_SECONDS: i64 = 3600;
const DEFAULT_AUTH_CACHE_SECONDS: u64 = 60;

/// Connection pool sizing and timeouts.
#[derive(Debug, Clone)]
pub struct DatabasePools {
    pub url: String,
    pub min_size: u32,
    pub max_size: u32,
    pub max_idle_timeout: u64,
    pub acquire_conn_timeout: u64,
    pub close_timeout: u64,
}

impl DatabasePools {
    fn from_environment() -> anyhow::Result<Self> {
        let host = required_var("DB_HOST")?;
        let port: u16 = var_parsed_or("DB_PORT", 5432)?;
        let name = required_var("DB_NAME")?;
        let username = required_var("DB_USERNAME")?;
        let password = required_var("DB_PASSWORD")?;

        let url = format!("postgres://{username}:{password}@{host}:{port}/{name}");

        Ok(DatabasePools {
            url,
            min_size: var_parsed_or("DB_POOL_MIN_SIZE", 1)?,
            max_size: var_parsed_or("DB_POOL_MAX_SIZE", 10)?,
            max_idle_timeout: var_parsed_or("DB_POOL_MAX_IDLE_TIMEOUT", 300)?,
            acquire_conn_timeout: var_parsed_or("DB_POOL_ACQUIRE_CONN_TIMEOUT", 5)?,
            close_timeout: var_parsed_or("DB_POOL_CLOSE_TIMEOUT", 10)?,
        })
    }
}

/// Process-wide configuration, built once by [`Server::from_environment`]
/// and shared behind an `Arc` as part of [`crate::app::AppState`].
pub struct Server {
    pub env: Env,
    pub ip: IpAddr,
    pub port: u16,
    pub db: DatabasePools,
    pub jwt_secret: Secret<String>,
    pub default_token_ttl_seconds: i64,
    pub auth_cache_seconds: u64,
    pub job_queue_query_interval: Duration,
    pub scheduler_delete_expired_interval: Duration,
    pub only_global_cidrs: bool,
    pub default_admin_user: Option<String>,
    pub default_admin_user_password: Option<Secret<String>>,
}

impl Server {
    pub fn from_environment() -> anyhow::Result<Self> {
        let env = match var_parsed_or("ENV", "development".to_string())?.as_str() {
            "production" => Env::Production,
            "test" => Env::Test,
            _ => Env::Development,
        };

        Ok(Server {
            env,
            ip: var_parsed_or("SERVER_IP", IpAddr::from([0, 0, 0, 0]))?,
            port: var_parsed_or("SERVER_PORT", 8080)?,
            db: DatabasePools::from_environment()?,
            jwt_secret: Secret::new(required_var("JWT_SECRET")?),
            default_token_ttl_seconds: var_parsed_or("DEFAULT_TOKEN_TTL_SECONDS", DEFAULT_TOKEN_TTL_SECONDS)?,
            auth_cache_seconds: var_parsed_or("AUTH_CACHE_SECONDS", DEFAULT_AUTH_CACHE_SECONDS)?,
            job_queue_query_interval: Duration::from_secs(var_parsed_or(
                "JOB_QUEUE_QUERY_INTERVAL",
                DEFAULT_JOB_QUEUE_QUERY_INTERVAL,
            )?),
            scheduler_delete_expired_interval: Duration::from_secs(var_parsed_or(
                "SCHEDULER_DELETE_EXPIRED_INTERVAL",
                DEFAULT_SCHEDULER_DELETE_EXPIRED_INTERVAL,
            )?),
            only_global_cidrs: var_parsed_or("ONLY_GLOBAL_CIDRS", true)?,
            default_admin_user: var_parsed::<String>("DEFAULT_ADMIN_USER")?,
            default_admin_user_password: var_parsed::<String>("DEFAULT_ADMIN_USER_PASSWORD")?.map(Secret::new),
        })
    }

    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.expose_secret().as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn set(vars: &[(&str, &str)]) {
        for (k, v) in vars {
            std::env::set_var(k, v);
        }
    }

    fn clear(vars: &[&str]) {
        for k in vars {
            std::env::remove_var(k);
        }
    }

    #[test]
    fn from_environment_applies_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        set(&[
            ("DB_HOST", "localhost"),
            ("DB_NAME", "cidrlist"),
            ("DB_USERNAME", "cidrlist"),
            ("DB_PASSWORD", "secret"),
            ("JWT_SECRET", "test-secret"),
        ]);
        clear(&["ONLY_GLOBAL_CIDRS", "SCHEDULER_DELETE_EXPIRED_INTERVAL"]);

        let server = Server::from_environment().unwrap();
        assert!(server.only_global_cidrs);
        assert_eq!(server.scheduler_delete_expired_interval, Duration::from_secs(30));
        assert_eq!(server.db.min_size, 1);

        clear(&["DB_HOST", "DB_NAME", "DB_USERNAME", "DB_PASSWORD", "JWT_SECRET"]);
    }
}
