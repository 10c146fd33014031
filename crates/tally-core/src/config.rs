//! Configuration loading
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/tally/config.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! An explicit path (e.g. `tally --config`) replaces both layers. Environment
//! variables are applied on top:
//! - `TALLY_SOURCE`: `local` or `remote`
//! - `TALLY_DATA_DIR`: snapshot directory for local mode
//! - `TALLY_BACKEND_URL`: backend URL for remote mode
//! - `TALLY_API_KEY`: backend API key
//! - `TALLY_ACCESS_TOKEN`: user access token sent as the bearer token
//! - `TALLY_USER`: identity recorded on fetched data

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Where records are loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Local,
    Remote,
}

impl FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            other => Err(Error::Config(format!("unknown source '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiversConfig {
    pub within_days: Option<u32>,
    #[serde(default = "default_receiver_limit")]
    pub limit: usize,
}

impl Default for ReceiversConfig {
    fn default() -> Self {
        Self {
            within_days: None,
            limit: default_receiver_limit(),
        }
    }
}

fn default_receiver_limit() -> usize {
    10
}

fn default_currency() -> String {
    "EUR".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceKind,
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub receivers: ReceiversConfig,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub user: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceKind::Local,
            data_dir: None,
            backend: BackendConfig::default(),
            receivers: ReceiversConfig::default(),
            currency: default_currency(),
            user: None,
        }
    }
}

/// Resolved location of the records
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// Directory of `<collection>.json` snapshots
    Local(PathBuf),
    Remote {
        url: String,
        api_key: String,
        /// Bearer token of the signed-in user; the API key is used when absent
        access_token: Option<String>,
    },
}

impl Config {
    /// Load config with override resolution and environment overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match override_path().filter(|p| p.exists()) {
                Some(path) => {
                    debug!("Loading config override from {}", path.display());
                    Self::from_file(&path)?
                }
                None => Self::from_toml(DEFAULT_CONFIG)?,
            },
        };
        config.apply_env()?;
        Ok(config)
    }

    /// The embedded defaults, without file or environment overrides
    pub fn embedded() -> Result<Self> {
        Self::from_toml(DEFAULT_CONFIG)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `TALLY_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the environment in production)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(source) = get("TALLY_SOURCE") {
            self.source = source.parse()?;
        }
        if let Some(dir) = get("TALLY_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(url) = get("TALLY_BACKEND_URL") {
            self.backend.url = Some(url);
        }
        if let Some(key) = get("TALLY_API_KEY") {
            self.backend.api_key = Some(key);
        }
        if let Some(token) = get("TALLY_ACCESS_TOKEN") {
            self.backend.access_token = Some(token);
        }
        if let Some(user) = get("TALLY_USER") {
            self.user = Some(user);
        }
        Ok(())
    }

    /// Resolve where records should be read from
    pub fn data_source(&self) -> Result<DataSource> {
        match self.source {
            SourceKind::Local => {
                let dir = match &self.data_dir {
                    Some(dir) => dir.clone(),
                    None => default_data_dir()?,
                };
                Ok(DataSource::Local(dir))
            }
            SourceKind::Remote => {
                let url = self.backend.url.clone().ok_or_else(|| {
                    Error::Config("remote source needs backend.url or TALLY_BACKEND_URL".into())
                })?;
                let api_key = self.backend.api_key.clone().ok_or_else(|| {
                    Error::Config("remote source needs backend.api_key or TALLY_API_KEY".into())
                })?;
                Ok(DataSource::Remote {
                    url,
                    api_key,
                    access_token: self.backend.access_token.clone(),
                })
            }
        }
    }
}

/// `~/.local/share/tally/config.toml` (platform equivalent elsewhere)
pub fn override_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("tally").join("config.toml"))
}

fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|d| d.join("tally").join("data"))
        .ok_or_else(|| Error::Config("no platform data directory, set TALLY_DATA_DIR".into()))
}
