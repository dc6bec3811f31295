//! Worker configuration.
//!
//! Every setting comes from an environment variable. A missing variable silently takes its default; a variable that
//! cannot be parsed is reported with a warning and also takes its default.
//!
//! | Variable              | Meaning                                        | Default                           |
//! |-----------------------|------------------------------------------------|-----------------------------------|
//! | `TDE_DATABASE_URL`    | SQLite database URL                            | `sqlite://data/team_dispatch.db`  |
//! | `TDE_MAX_CONNECTIONS` | connection pool size                           | 8                                 |
//! | `TDE_SWEEP_INTERVAL`  | seconds between reaper sweeps                  | 30                                |
//! | `TDE_RUN_MIGRATIONS`  | apply embedded migrations on start-up          | true                              |
use std::{env, fmt::Display, str::FromStr, time::Duration as StdDuration};

use log::*;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/team_dispatch.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Time between reaper sweeps.
    pub sweep_interval: StdDuration,
    /// If true, the embedded migrations are applied before the first sweep.
    pub run_migrations: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            sweep_interval: StdDuration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            run_migrations: true,
        }
    }
}

impl WorkerConfig {
    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source. `lookup` returns `None` for unset variables.
    pub fn from_lookup<F>(lookup: F) -> Self
    where F: Fn(&str) -> Option<String> {
        let database_url = lookup("TDE_DATABASE_URL").unwrap_or_else(|| {
            info!("🪛️ TDE_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections =
            parse_or_default("TDE_MAX_CONNECTIONS", lookup("TDE_MAX_CONNECTIONS"), DEFAULT_MAX_CONNECTIONS);
        let max_connections = if max_connections == 0 {
            warn!("🪛️ TDE_MAX_CONNECTIONS must be at least 1. Using the default, {DEFAULT_MAX_CONNECTIONS}.");
            DEFAULT_MAX_CONNECTIONS
        } else {
            max_connections
        };
        let sweep_secs =
            parse_or_default("TDE_SWEEP_INTERVAL", lookup("TDE_SWEEP_INTERVAL"), DEFAULT_SWEEP_INTERVAL_SECS);
        let sweep_secs = if sweep_secs == 0 {
            warn!("🪛️ TDE_SWEEP_INTERVAL must be at least 1s. Using the default, {DEFAULT_SWEEP_INTERVAL_SECS}.");
            DEFAULT_SWEEP_INTERVAL_SECS
        } else {
            sweep_secs
        };
        let run_migrations = lookup("TDE_RUN_MIGRATIONS").map(|s| &s != "0" && &s != "false").unwrap_or(true);
        Self {
            database_url,
            max_connections,
            sweep_interval: StdDuration::from_secs(sweep_secs),
            run_migrations,
        }
    }
}

fn parse_or_default<T>(name: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match value {
        None => default,
        Some(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ Invalid configuration value for {name}: '{s}'. {e} Using the default, {default}.");
            default
        }),
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> WorkerConfig {
        let vars = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<HashMap<_, _>>();
        WorkerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]);
        assert_eq!(config.database_url, "sqlite://data/team_dispatch.db");
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.sweep_interval, StdDuration::from_secs(30));
        assert!(config.run_migrations);
    }

    #[test]
    fn values_are_read_from_the_environment() {
        let config = config_from(&[
            ("TDE_DATABASE_URL", "sqlite://other.db"),
            ("TDE_MAX_CONNECTIONS", "3"),
            ("TDE_SWEEP_INTERVAL", " 5 "),
            ("TDE_RUN_MIGRATIONS", "false"),
        ]);
        assert_eq!(config.database_url, "sqlite://other.db");
        assert_eq!(config.max_connections, 3);
        assert_eq!(config.sweep_interval, StdDuration::from_secs(5));
        assert!(!config.run_migrations);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("TDE_MAX_CONNECTIONS", "lots"),
            ("TDE_SWEEP_INTERVAL", "0"),
            ("TDE_RUN_MIGRATIONS", "1"),
        ]);
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.sweep_interval, StdDuration::from_secs(30));
        assert!(config.run_migrations);
    }
}
