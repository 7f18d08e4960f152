//! Bridge Configuration
//!
//! Read from the environment (a `.env` file is honoured by the binary) with an
//! optional YAML file supplying the label set and its severity mapping.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::actuation::{SeverityTable, SeverityTier, TableError};
use crate::capability::ProbeOverrides;
use crate::classifier::{ClassifierError, LabelSet};

pub const ENV_HOST: &str = "LEAF_BRIDGE_HOST";
pub const ENV_PORT: &str = "LEAF_BRIDGE_PORT";
pub const ENV_MODEL_PATH: &str = "LEAF_BRIDGE_MODEL_PATH";
pub const ENV_LABELS_PATH: &str = "LEAF_BRIDGE_LABELS_PATH";
pub const ENV_MODEL_VERSION: &str = "LEAF_BRIDGE_MODEL_VERSION";
pub const ENV_DISABLE_CODEC: &str = "LEAF_BRIDGE_DISABLE_CODEC";
pub const ENV_DISABLE_CLASSIFIER: &str = "LEAF_BRIDGE_DISABLE_CLASSIFIER";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a port number, got '{value}'")]
    InvalidPort { var: &'static str, value: String },
    #[error("{var} must be a boolean, got '{value}'")]
    InvalidFlag { var: &'static str, value: String },
    #[error("failed to read label file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse label file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error(transparent)]
    Labels(#[from] ClassifierError),
    #[error(transparent)]
    Severity(#[from] TableError),
}

/// On-disk shape of the label file.
#[derive(Debug, Deserialize)]
struct LabelFile {
    labels: Vec<String>,
    #[serde(default)]
    severity: BTreeMap<String, SeverityTier>,
}

/// Label set plus the severity table validated against it.
#[derive(Debug, Clone, PartialEq)]
pub struct Taxonomy {
    pub labels: LabelSet,
    pub severity: SeverityTable,
}

impl Taxonomy {
    pub fn reference() -> Self {
        Self {
            labels: LabelSet::reference(),
            severity: SeverityTable::reference(),
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let file: LabelFile = serde_yaml::from_str(text)?;
        let labels = LabelSet::new(file.labels)?;
        let severity = SeverityTable::new(&labels, file.severity)?;
        Ok(Self { labels, severity })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::reference()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    pub host: String,
    pub port: u16,
    /// Optional model artifact, loaded at start-up when present
    pub model_path: Option<PathBuf>,
    pub taxonomy: Taxonomy,
    pub model_version: String,
    pub overrides: ProbeOverrides,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            model_path: None,
            taxonomy: Taxonomy::reference(),
            model_version: "1.0".to_string(),
            overrides: ProbeOverrides::default(),
        }
    }
}

impl BridgeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source; `from_env` uses the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match lookup(ENV_PORT) {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidPort {
                var: ENV_PORT,
                value: value.clone(),
            })?,
            None => defaults.port,
        };

        let taxonomy = match lookup(ENV_LABELS_PATH).filter(|p| !p.trim().is_empty()) {
            Some(path) => Taxonomy::load(Path::new(&path))?,
            None => defaults.taxonomy,
        };

        Ok(Self {
            host: lookup(ENV_HOST).unwrap_or(defaults.host),
            port,
            model_path: lookup(ENV_MODEL_PATH)
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            taxonomy,
            model_version: lookup(ENV_MODEL_VERSION).unwrap_or(defaults.model_version),
            overrides: ProbeOverrides {
                disable_codec: parse_flag(ENV_DISABLE_CODEC, lookup(ENV_DISABLE_CODEC))?,
                disable_classifier: parse_flag(ENV_DISABLE_CLASSIFIER, lookup(ENV_DISABLE_CLASSIFIER))?,
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(var: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = value else { return Ok(false) };
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        _ => Err(ConfigError::InvalidFlag { var, value }),
    }
}
