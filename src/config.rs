//! Settings for talking to a store and running truthy passes.
//!
//! Persisted as TOML:
//!
//! ```toml
//! [endpoint]
//! url = "http://localhost:9999/bigdata/namespace/wdq/sparql"
//! user = "admin"
//! password = "secret"
//! timeout_secs = 60
//!
//! [truthy]
//! batch_size = 1000
//! parallel = false
//! ```

use std::path::Path;

use oxigraph::model::NamedNode;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Connection parameters for a SPARQL endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Query endpoint URL (also used for updates unless `update_url` is set).
    pub url: String,
    /// Separate update endpoint, for stores that split them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_url: Option<String>,
    /// Basic auth user name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Basic auth password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}
fn default_batch_size() -> usize {
    1000
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            update_url: None,
            user: None,
            password: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EndpointConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn update_url(&self) -> &str {
        self.update_url.as_deref().unwrap_or(&self.url)
    }

    /// Check both URLs are absolute http(s) IRIs.
    pub fn validate(&self) -> ConfigResult<()> {
        check_url(&self.url)?;
        if let Some(update) = &self.update_url {
            check_url(update)?;
        }
        Ok(())
    }
}

fn check_url(url: &str) -> ConfigResult<()> {
    let iri = NamedNode::new(url).map_err(|e| ConfigError::InvalidEndpoint {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    let scheme_ok = iri.as_str().starts_with("http://") || iri.as_str().starts_with("https://");
    if !scheme_ok {
        return Err(ConfigError::InvalidEndpoint {
            url: url.to_string(),
            message: "only http and https are supported".into(),
        });
    }
    Ok(())
}

/// Tuning for truthy passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruthyConfig {
    /// Maximum number of keys per bulk rewrite.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Dispatch batches concurrently.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for TruthyConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            parallel: false,
        }
    }
}

impl TruthyConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        Ok(())
    }
}

/// Everything the CLI reads from its config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub truthy: TruthyConfig,
}

impl Settings {
    pub fn validate(&self) -> ConfigResult<()> {
        self.endpoint.validate()?;
        self.truthy.validate()
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".into(),
            message: e.to_string(),
        })
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}
