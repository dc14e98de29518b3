//! Small helpers for reading configuration out of the process environment.
//!
//! Every other crate in the workspace goes through here instead of calling
//! `std::env::var` directly, so that missing/malformed variables produce a
//! consistent `anyhow::Error` with the variable name attached.

use std::env::VarError;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::{anyhow, Context};

/// Reads an optional environment variable.
///
/// Returns `Ok(None)` if the variable is not set. Fails if the variable is
/// set but not valid UTF-8.
pub fn var(key: &str) -> anyhow::Result<Option<String>> {
    match std::env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(anyhow!("{key} is not valid UTF-8")),
    }
}

/// Reads an optional environment variable and parses it with [`FromStr`].
pub fn var_parsed<R>(key: &str) -> anyhow::Result<Option<R>>
where
    R: FromStr,
    R::Err: Display,
{
    match var(key)? {
        None => Ok(None),
        Some(content) => content
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("failed to parse {key}: {e}")),
    }
}

/// Reads a required environment variable, failing if it is unset.
pub fn required_var(key: &str) -> anyhow::Result<String> {
    var(key)?.ok_or_else(|| anyhow!("{key} must be set"))
}

/// Reads a required environment variable and parses it with [`FromStr`].
pub fn required_var_parsed<R>(key: &str) -> anyhow::Result<R>
where
    R: FromStr,
    R::Err: Display,
{
    required_var(key)?
        .parse()
        .with_context(|| format!("failed to parse {key}"))
}

/// Like [`var_parsed`], but returns `default` when the variable is unset.
pub fn var_parsed_or<R>(key: &str, default: R) -> anyhow::Result<R>
where
    R: FromStr,
    R::Err: Display,
{
    Ok(var_parsed(key)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn var_parsed_returns_none_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("CIDRLIST_ENV_VARS_TEST_UNSET");
        let value: Option<u32> = var_parsed("CIDRLIST_ENV_VARS_TEST_UNSET").unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn var_parsed_parses_set_value() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("CIDRLIST_ENV_VARS_TEST_SET", "42");
        let value: Option<u32> = var_parsed("CIDRLIST_ENV_VARS_TEST_SET").unwrap();
        assert_eq!(value, Some(42));
        std::env::remove_var("CIDRLIST_ENV_VARS_TEST_SET");
    }

    #[test]
    fn required_var_fails_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("CIDRLIST_ENV_VARS_TEST_REQUIRED");
        assert!(required_var("CIDRLIST_ENV_VARS_TEST_REQUIRED").is_err());
    }

    #[test]
    fn var_parsed_or_falls_back_to_default() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("CIDRLIST_ENV_VARS_TEST_DEFAULT");
        let value: u32 = var_parsed_or("CIDRLIST_ENV_VARS_TEST_DEFAULT", 7).unwrap();
        assert_eq!(value, 7);
    }
}
