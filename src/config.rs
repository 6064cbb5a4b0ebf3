// Runtime configuration
//
// Resolution order for each setting: explicit value (CLI flag) > environment
// variable > built-in default. The budget is a session setting only; it is
// never written to the database.

use crate::error::ValidationError;
use crate::money::Money;
use std::path::PathBuf;

pub const DB_ENV: &str = "EXPENSE_TRACKER_DB";
pub const BUDGET_ENV: &str = "EXPENSE_TRACKER_BUDGET";
pub const ADDR_ENV: &str = "EXPENSE_TRACKER_ADDR";

pub const DB_FILE_NAME: &str = "expense_tracker.db";
pub const APP_DIR_NAME: &str = "expense-tracker";
pub const DEFAULT_BUDGET: Money = Money::from_cents(100_000);
pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub budget: Money,
    pub server_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: default_db_path(),
            budget: DEFAULT_BUDGET,
            server_addr: DEFAULT_ADDR.to_string(),
        }
    }
}

impl Config {
    /// Build from explicit overrides, falling back to the environment and then defaults
    pub fn resolve(
        db_path: Option<PathBuf>,
        budget: Option<Money>,
        server_addr: Option<String>,
    ) -> Result<Self, ValidationError> {
        Self::resolve_with(db_path, budget, server_addr, |key| std::env::var(key).ok())
    }

    fn resolve_with(
        db_path: Option<PathBuf>,
        budget: Option<Money>,
        server_addr: Option<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ValidationError> {
        let db_path = db_path_with(db_path, &env);
        let budget = budget_with(budget, &env)?;

        let server_addr = server_addr
            .or_else(|| env(ADDR_ENV).filter(|v| !v.is_empty()))
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());

        Ok(Config {
            db_path,
            budget,
            server_addr,
        })
    }
}

/// Database path only: flag > `EXPENSE_TRACKER_DB` > platform default
pub fn resolve_db_path(db_path: Option<PathBuf>) -> PathBuf {
    db_path_with(db_path, |key| std::env::var(key).ok())
}

/// Session budget only: flag > `EXPENSE_TRACKER_BUDGET` > default
pub fn resolve_budget(budget: Option<Money>) -> Result<Money, ValidationError> {
    budget_with(budget, |key| std::env::var(key).ok())
}

fn db_path_with(db_path: Option<PathBuf>, env: impl Fn(&str) -> Option<String>) -> PathBuf {
    db_path
        .or_else(|| env(DB_ENV).filter(|v| !v.is_empty()).map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

fn budget_with(budget: Option<Money>, env: impl Fn(&str) -> Option<String>) -> Result<Money, ValidationError> {
    match budget {
        Some(b) => Ok(b),
        None => match env(BUDGET_ENV).filter(|v| !v.is_empty()) {
            Some(raw) => parse_budget(&raw),
            None => Ok(DEFAULT_BUDGET),
        },
    }
}

/// Budget values share the amount syntax but may not be negative
pub fn parse_budget(raw: &str) -> Result<Money, ValidationError> {
    let budget = Money::parse(raw).map_err(|e| ValidationError::new("budget", e.to_string()))?;
    if budget.is_negative() {
        return Err(ValidationError::new("budget", "must not be negative"));
    }
    Ok(budget)
}

/// `<data dir>/expense-tracker/expense_tracker.db`, or the working directory
/// when the platform has no data directory
pub fn default_db_path() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join(APP_DIR_NAME).join(DB_FILE_NAME),
        None => PathBuf::from(DB_FILE_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::resolve_with(None, None, None, env_of(&[])).unwrap();

        assert_eq!(config.budget, Money::from_cents(100_000));
        assert_eq!(config.server_addr, "127.0.0.1:3000");
        assert!(config.db_path.ends_with(DB_FILE_NAME));
    }

    #[test]
    fn test_env_overrides_defaults() {
        let env = env_of(&[(DB_ENV, "/tmp/x.db"), (BUDGET_ENV, "250.50"), (ADDR_ENV, "0.0.0.0:8080")]);
        let config = Config::resolve_with(None, None, None, env).unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.budget, Money::from_cents(25050));
        assert_eq!(config.server_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_flags_override_env() {
        let env = env_of(&[(DB_ENV, "/tmp/x.db"), (BUDGET_ENV, "250")]);
        let config = Config::resolve_with(
            Some(PathBuf::from("here.db")),
            Some(Money::from_cents(500)),
            None,
            env,
        )
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("here.db"));
        assert_eq!(config.budget, Money::from_cents(500));
    }

    #[test]
    fn test_db_path_ignores_bad_budget() {
        let env = env_of(&[(DB_ENV, "/tmp/x.db"), (BUDGET_ENV, "lots")]);

        assert_eq!(db_path_with(None, &env), PathBuf::from("/tmp/x.db"));
        assert!(budget_with(None, &env).is_err());
        assert_eq!(budget_with(Some(Money::from_cents(5)), &env).unwrap(), Money::from_cents(5));
    }

    #[test]
    fn test_bad_budget_env_is_rejected() {
        let err = Config::resolve_with(None, None, None, env_of(&[(BUDGET_ENV, "lots")])).unwrap_err();
        assert_eq!(err.field, "budget");

        assert!(parse_budget("-1").is_err());
        assert_eq!(parse_budget("0").unwrap(), Money::zero());
    }
}
