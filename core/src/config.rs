//! Client configuration.
//!
//! Precedence (lowest to highest):
//! 1. `ClientConfig::default()`
//! 2. `storefront.yaml` in the working directory (optional)
//! 3. `STOREFRONT_*` environment variables

use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "storefront.yaml";
pub const ENV_PREFIX: &str = "STOREFRONT_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root of the REST API; request URIs are joined onto it.
    pub base_url: String,
    /// Sent as `App-Domain` on every request.
    pub domain: String,
    /// Whole-request timeout for the default transport. None waits forever.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            domain: "localhost".to_string(),
            timeout_secs: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str, domain: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            domain: domain.to_string(),
            timeout_secs: None,
        }
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::extract(
            Figment::new()
                .merge(Serialized::defaults(ClientConfig::default()))
                .merge(Yaml::file(CONFIG_FILE))
                .merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::extract(
            Figment::new()
                .merge(Serialized::defaults(ClientConfig::default()))
                .merge(Yaml::file(path.as_ref())),
        )
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: ClientConfig = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        if self.domain.trim().is_empty() {
            return Err(ConfigError::EmptyDomain);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
