use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{InventoryError, Result};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Memory,
    Sqlite,
    Libsql,
}

impl FromStr for Backend {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Backend::Memory),
            "sqlite" => Ok(Backend::Sqlite),
            "libsql" | "turso" => Ok(Backend::Libsql),
            other => Err(InventoryError::Config(format!(
                "unknown storage backend '{other}' (expected memory, sqlite or libsql)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: Backend,
    pub sqlite_path: String,
    pub libsql_url: Option<String>,
    pub libsql_auth_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            sqlite_path: "data/inventory.db".to_string(),
            libsql_url: None,
            libsql_auth_token: None,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9898,
        }
    }
}

impl Config {
    /// Load `config.toml` if present, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let config = if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::read_file(DEFAULT_CONFIG_PATH)?
        } else {
            Self::default()
        };
        config.with_env_overrides()
    }

    /// Load an explicit config file, then apply environment overrides.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::read_file(path)?.with_env_overrides()
    }

    fn read_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            InventoryError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    fn with_env_overrides(self) -> Result<Self> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("INVENTORY_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("INVENTORY_PORT") {
            self.server.port = parse_port("INVENTORY_PORT", &port)?;
        }
        if let Some(backend) = lookup("INVENTORY_BACKEND") {
            self.storage.backend = backend.parse()?;
        }
        if let Some(path) = lookup("INVENTORY_SQLITE_PATH") {
            self.storage.sqlite_path = path;
        }
        if let Some(url) = lookup("LIBSQL_URL") {
            self.storage.libsql_url = Some(url);
        }
        if let Some(token) = lookup("LIBSQL_AUTH_TOKEN") {
            self.storage.libsql_auth_token = Some(token);
        }
        if let Some(port) = lookup("INVENTORY_METRICS_PORT") {
            self.metrics.port = parse_port("INVENTORY_METRICS_PORT", &port)?;
            self.metrics.enabled = true;
        }
        Ok(self)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_port(key: &str, raw: &str) -> Result<u16> {
    raw.trim()
        .parse()
        .map_err(|_| InventoryError::Config(format!("{key} must be a port number, got '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[storage]\nbackend = \"sqlite\"\nsqlite_path = \"/tmp/items.db\"").unwrap();

        let config = Config::read_file(file.path()).unwrap();
        assert_eq!(config.storage.backend, Backend::Sqlite);
        assert_eq!(config.storage.sqlite_path, "/tmp/items.db");
        assert_eq!(config.server.port, 8080);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_env_overrides_win() {
        let vars: HashMap<&str, &str> = [
            ("INVENTORY_PORT", "9000"),
            ("INVENTORY_BACKEND", "Turso"),
            ("LIBSQL_URL", "libsql://example.turso.io"),
        ]
        .into_iter()
        .collect();

        let config = Config::default()
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.backend, Backend::Libsql);
        assert_eq!(config.storage.libsql_url.as_deref(), Some("libsql://example.turso.io"));
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        let bad_port = Config::default().apply_overrides(|key| {
            (key == "INVENTORY_PORT").then(|| "eighty".to_string())
        });
        assert!(matches!(bad_port, Err(InventoryError::Config(_))));

        assert!("postgres".parse::<Backend>().is_err());
    }
}
