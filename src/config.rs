//! Application configuration.
//!
//! [`AppConfig`] is read from an optional YAML file; every field has a
//! default so an empty file (or no file) yields a working local setup.
//! CLI flags are applied on top by the `serve` command.
//!
//! The coroutine stack size can also be set with `PEOPLE_STACK_SIZE`, in
//! decimal (`32768`) or hexadecimal (`0x8000`).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_STACK_SIZE: usize = 0x8000;
pub const STACK_SIZE_ENV: &str = "PEOPLE_STACK_SIZE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://people.db".to_string(),
        }
    }
}

/// Where the root specification lives. `file` is relative to `dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecConfig {
    pub dir: PathBuf,
    pub file: PathBuf,
}

impl Default for SpecConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            file: PathBuf::from("swagger/swagger.yml"),
        }
    }
}

/// Per-API options: which auxiliary endpoints are mounted next to the
/// operations. A partial mapping fills the rest from the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiOptions {
    pub spec_endpoints: bool,
    pub console_ui: bool,
    pub console_ui_path: String,
    pub console_ui_config: Option<Value>,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            spec_endpoints: true,
            console_ui: true,
            console_ui_path: "/ui".to_string(),
            console_ui_config: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Stack size for handler coroutines, in bytes.
    #[serde(deserialize_with = "deserialize_stack_size")]
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl RuntimeConfig {
    /// Apply `PEOPLE_STACK_SIZE` when set and valid.
    pub fn apply_env(mut self) -> Self {
        if let Some(size) = env::var(STACK_SIZE_ENV).ok().and_then(|v| parse_size(&v)) {
            self.stack_size = size;
        }
        self
    }
}

/// Parse `16384` or `0x4000`.
pub fn parse_size(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

fn deserialize_stack_size<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Number(usize),
        Text(String),
    }

    match Size::deserialize(deserializer)? {
        Size::Number(n) => Ok(n),
        Size::Text(s) => parse_size(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid stack size `{s}`"))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub spec: SpecConfig,
    pub templates_dir: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub watch: bool,
    pub api: ApiOptions,
    pub runtime: RuntimeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            spec: SpecConfig::default(),
            templates_dir: PathBuf::from("templates"),
            static_dir: Some(PathBuf::from("static")),
            watch: false,
            api: ApiOptions::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read `path` when given, otherwise return the defaults.
    ///
    /// # Errors
    ///
    /// A given file that is missing or not valid YAML.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Root specification path, resolved against the specification directory.
    pub fn spec_path(&self) -> PathBuf {
        self.spec.dir.join(&self.spec.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.server.addr(), "127.0.0.1:5000");
        assert_eq!(config.database.url, "sqlite://people.db");
        assert_eq!(config.spec_path(), PathBuf::from("./swagger/swagger.yml"));
        assert_eq!(config.runtime.stack_size, 0x8000);
        assert!(config.api.spec_endpoints);
        assert_eq!(config.api.console_ui_path, "/ui");
    }

    #[test]
    fn test_partial_yaml() {
        let config = AppConfig::from_yaml_str(
            "server:\n  port: 8080\nruntime:\n  stack_size: \"0x4000\"\napi:\n  console_ui: false\n",
        )
        .unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.runtime.stack_size, 0x4000);
        assert!(!config.api.console_ui);
        assert!(config.api.spec_endpoints);
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(AppConfig::from_yaml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/config.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("16384"), Some(16384));
        assert_eq!(parse_size("0x4000"), Some(0x4000));
        assert_eq!(parse_size("0xZZ"), None);
        assert_eq!(parse_size("big"), None);
    }

    #[test]
    fn test_api_options_partial_mapping() {
        let options: ApiOptions = serde_json::from_value(json!({
            "console_ui_path": "/console",
            "console_ui_config": { "docExpansion": "none" }
        }))
        .unwrap();
        assert!(options.spec_endpoints);
        assert!(options.console_ui);
        assert_eq!(options.console_ui_path, "/console");
        assert_eq!(
            options.console_ui_config,
            Some(json!({ "docExpansion": "none" }))
        );
    }

    #[test]
    fn test_api_options_bad_type() {
        assert!(serde_json::from_value::<ApiOptions>(json!({ "console_ui": "yes" })).is_err());
    }
}
