//! Server configuration.

use std::{env, fmt, path::PathBuf, str::FromStr};

use task_store::DEFAULT_STORAGE_KEY;

/// Which task store backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Single-table SQLite database file.
    Sqlite,
    /// JSON document in key-value file storage.
    Local,
}

impl StoreBackend {
    /// Returns the configuration name of the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "local" => Ok(Self::Local),
            other => anyhow::bail!("unknown store backend {other:?} (expected \"sqlite\" or \"local\")"),
        }
    }
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Selected task store.
    pub store_backend: StoreBackend,
    /// SQLite database file (sqlite backend).
    pub database_path: PathBuf,
    /// Directory holding task documents (local backend).
    pub local_storage_dir: PathBuf,
    /// Document key (local backend).
    pub storage_key: String,
    /// Log level.
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = var("TODO_SERVER_PORT", "3000");
        let port = port
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("invalid TODO_SERVER_PORT {port:?}: {e}"))?;

        Ok(Self {
            host: var("TODO_SERVER_HOST", "0.0.0.0"),
            port,
            store_backend: var("TODO_STORE_BACKEND", "sqlite").parse()?,
            database_path: var("TODO_DATABASE_PATH", "data/todos.db").into(),
            local_storage_dir: var("TODO_LOCAL_STORAGE_DIR", "data/local").into(),
            storage_key: var("TODO_STORAGE_KEY", DEFAULT_STORAGE_KEY),
            log_level: var("TODO_LOG_LEVEL", "info"),
        })
    }

    /// Returns the server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.server_addr(), "0.0.0.0:3000");
        assert_eq!(config.store_backend, StoreBackend::Sqlite);
        assert_eq!(config.database_path, PathBuf::from("data/todos.db"));
        assert_eq!(config.storage_key, "todo-app-data");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_local_backend() {
        let config = load(&[
            ("TODO_STORE_BACKEND", "Local"),
            ("TODO_LOCAL_STORAGE_DIR", "/tmp/todos"),
            ("TODO_STORAGE_KEY", "my-todos"),
            ("TODO_SERVER_PORT", "8080"),
        ])
        .unwrap();

        assert_eq!(config.store_backend, StoreBackend::Local);
        assert_eq!(config.local_storage_dir, PathBuf::from("/tmp/todos"));
        assert_eq!(config.storage_key, "my-todos");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_values() {
        assert!(load(&[("TODO_STORE_BACKEND", "postgres")]).is_err());
        assert!(load(&[("TODO_SERVER_PORT", "http")]).is_err());
    }
}
