use std::env;

use thiserror::Error;

const HOST_KEY: &str = "LEDGER_HOST";
const PORT_KEY: &str = "LEDGER_PORT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;

/// Errors that can occur while loading the node configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Runtime settings for the HTTP node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Interface to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl NodeConfig {
    /// Loads the configuration from `LEDGER_HOST` and `LEDGER_PORT`,
    /// falling back to the defaults for unset variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = NodeConfig::default();

        if let Some(host) = lookup(HOST_KEY) {
            config.host = host;
        }

        if let Some(port) = lookup(PORT_KEY) {
            config.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: PORT_KEY,
                value: port.clone(),
            })?;
        }

        Ok(config)
    }
}
