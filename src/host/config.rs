//! Host configuration.
//!
//! Values come from defaults, a TOML document, and `FERROUS_HOST_*`
//! environment variables, in increasing priority.

use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HostError, HostResult};

/// Prefix of environment variables read by [`HostConfig::from_env`].
pub const ENV_PREFIX: &str = "FERROUS_HOST";

/// Settings for [`HttpHost`](crate::HttpHost).
///
/// ```
/// use ferrous_host::HostConfig;
///
/// let config = HostConfig::from_toml_str(r#"
///     bind_address = "0.0.0.0:9000"
///     worker_threads = 8
/// "#).unwrap();
/// assert_eq!(config.worker_threads, 8);
/// assert!(!config.expose_error_details);
/// assert_eq!(config.log_filter, "info");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub bind_address: String,
    pub worker_threads: usize,
    /// Include the error chain in 500 responses.
    pub expose_error_details: bool,
    pub plugin_dir: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            worker_threads: 4,
            expose_error_details: false,
            plugin_dir: None,
            log_filter: "info".to_string(),
        }
    }
}

impl HostConfig {
    pub fn from_toml_str(source: &str) -> HostResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|err| HostError::Config(format!("invalid TOML: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> HostResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|err| HostError::Config(format!("cannot read {}: {err}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Defaults overlaid with `FERROUS_HOST_*` variables.
    pub fn from_env() -> HostResult<Self> {
        let mut config = Self::default();
        config.apply(&EnvironmentSource::new(ENV_PREFIX))?;
        config.validate()?;
        Ok(config)
    }

    /// Overlays every key present in `source`.
    pub fn apply(&mut self, source: &dyn ConfigSource) -> HostResult<()> {
        if let Some(value) = source.get("bind_address") {
            self.bind_address = value;
        }
        if let Some(value) = source.get("worker_threads") {
            self.worker_threads = value
                .trim()
                .parse()
                .map_err(|_| HostError::Config(format!("worker_threads: `{value}` is not a number")))?;
        }
        if let Some(value) = source.get("expose_error_details") {
            self.expose_error_details = parse_bool(&value)
                .ok_or_else(|| HostError::Config(format!("expose_error_details: `{value}` is not a boolean")))?;
        }
        if let Some(value) = source.get("plugin_dir") {
            self.plugin_dir = (!value.is_empty()).then(|| PathBuf::from(value));
        }
        if let Some(value) = source.get("log_filter") {
            self.log_filter = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> HostResult<()> {
        if self.worker_threads == 0 {
            return Err(HostError::Config("worker_threads must be at least 1".into()));
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> HostResult<SocketAddr> {
        self.bind_address
            .parse()
            .map_err(|_| HostError::Config(format!("bind_address: `{}` is not host:port", self.bind_address)))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// A flat key/value source for [`HostConfig::apply`].
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads `<PREFIX>_<KEY>` from the process environment.
#[derive(Debug, Clone)]
pub struct EnvironmentSource {
    prefix: String,
}

impl EnvironmentSource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl ConfigSource for EnvironmentSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}_{}", self.prefix.to_uppercase(), key.to_uppercase())).ok()
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_are_valid() {
        let config = HostConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn overlay_replaces_only_present_keys() {
        let mut config = HostConfig::default();
        config
            .apply(&source(&[("worker_threads", "2"), ("expose_error_details", "yes")]))
            .unwrap();
        assert_eq!(config.worker_threads, 2);
        assert!(config.expose_error_details);
        assert_eq!(config.bind_address, "127.0.0.1:8080");
    }

    #[test]
    fn bad_values_are_config_errors() {
        let mut config = HostConfig::default();
        assert!(matches!(
            config.apply(&source(&[("worker_threads", "many")])),
            Err(HostError::Config(_))
        ));
        assert!(matches!(
            config.apply(&source(&[("expose_error_details", "maybe")])),
            Err(HostError::Config(_))
        ));
    }

    #[test]
    fn zero_workers_rejected() {
        let err = HostConfig::from_toml_str("worker_threads = 0").unwrap_err();
        assert!(err.to_string().contains("worker_threads"));
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(HostConfig::from_toml_str("bind = \"x\"").is_err());
    }
}
