//! Server settings read from the environment.

use std::path::PathBuf;

pub const HOST_VAR: &str = "EDITOR_HOST";
pub const PORT_VAR: &str = "EDITOR_PORT";
pub const DB_PATH_VAR: &str = "EDITOR_DB_PATH";
pub const JSON_LIMIT_VAR: &str = "EDITOR_JSON_LIMIT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub json_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_path: PathBuf::from("correos.sqlite"),
            json_limit_bytes: 10 * 1024 * 1024, // 10 MB
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value {value:?} for {variable}")]
pub struct ConfigError {
    pub variable: &'static str,
    pub value: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; unset variables keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ServerConfig::default();
        if let Some(host) = lookup(HOST_VAR) {
            config.host = host;
        }
        if let Some(port) = lookup(PORT_VAR) {
            config.port = parse_number(PORT_VAR, port)?;
        }
        if let Some(path) = lookup(DB_PATH_VAR) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(limit) = lookup(JSON_LIMIT_VAR) {
            config.json_limit_bytes = parse_number(JSON_LIMIT_VAR, limit)?;
        }
        Ok(config)
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn parse_number<T: std::str::FromStr>(variable: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError { variable, value })
}
