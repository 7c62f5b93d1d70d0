//! `epi_map.toml` configuration with environment overrides.
//!
//! Every field has a default, so an absent file or an empty table is a
//! valid configuration. Environment variables override file values:
//!
//! | Variable | Overrides |
//! |---|---|
//! | `EPI_MAP_CONFIG` | Path of the TOML file itself (default `epi_map.toml`) |
//! | `EPI_MAP_DATASET` | `data.dataset` |
//! | `EPI_MAP_BOUNDARIES` | `data.boundaries` |
//! | `EPI_MAP_CACHE_DIR` | `cache.dir` |
//! | `EPI_MAP_POLICY` | `aggregation.policy` |
//! | `BIND_ADDR` | `server.bind_addr` |
//! | `PORT` | `server.port` |

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use epi_map_normalize::{AliasTable, CanonicalField};
use epi_map_observation_models::AccumulationPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "EPI_MAP_CONFIG";
/// Config file used when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "epi_map.toml";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the config file failed.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or has fields of the wrong type.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// An override holds a value that does not parse.
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue {
        /// Variable or key name.
        name: String,
        /// The rejected value.
        value: String,
    },

    /// An `[aliases]` key is not a canonical field.
    #[error("Unknown alias field: {0}")]
    UnknownAliasField(String),
}

/// Input file locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Observation CSV.
    pub dataset: PathBuf,
    /// State boundary `GeoJSON`. Without it choropleths are empty.
    pub boundaries: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("data/dataset.csv"),
            boundaries: Some(PathBuf::from("data/us-states.geojson")),
        }
    }
}

/// Local cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding the dataset cache and preferences.
    pub dir: PathBuf,
    /// When `false`, the dataset cache is neither read nor written.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".epi_map"),
            enabled: true,
        }
    }
}

/// Aggregation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// How population and density are chosen among a state's rows.
    pub policy: AccumulationPolicy,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
    /// Optional directory of frontend files served at `/`.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpiMapConfig {
    /// `[data]`
    pub data: DataConfig,
    /// `[cache]`
    pub cache: CacheConfig,
    /// `[aggregation]`
    pub aggregation: AggregationConfig,
    /// `[aliases]`: extra source headers per canonical field, tried after
    /// the built-in ones (e.g. `cases = ["Reported Cases"]`).
    pub aliases: BTreeMap<String, Vec<String>>,
    /// `[server]`
    pub server: ServerConfig,
}

impl EpiMapConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// * If the TOML is malformed or a field has the wrong type
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads the config file at `path`. A missing file yields the
    /// defaults.
    ///
    /// # Errors
    ///
    /// * If the file exists but cannot be read
    /// * If the TOML is malformed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                log::info!("Loading config from {}", path.display());
                Self::from_toml_str(&contents)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Loads the file named by `EPI_MAP_CONFIG` (or `epi_map.toml`) and
    /// applies environment overrides.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read or parsed
    /// * If an override variable holds an invalid value
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load(Path::new(&path))?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Applies overrides from `var`, which maps a variable name to its
    /// value. Empty values are ignored.
    ///
    /// # Errors
    ///
    /// * If `EPI_MAP_POLICY` is not a known policy
    /// * If `PORT` is not a valid port number
    pub fn apply_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let lookup = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        if let Some(dataset) = lookup("EPI_MAP_DATASET") {
            self.data.dataset = PathBuf::from(dataset);
        }
        if let Some(boundaries) = lookup("EPI_MAP_BOUNDARIES") {
            self.data.boundaries = Some(PathBuf::from(boundaries));
        }
        if let Some(dir) = lookup("EPI_MAP_CACHE_DIR") {
            self.cache.dir = PathBuf::from(dir);
        }
        if let Some(policy) = lookup("EPI_MAP_POLICY") {
            self.aggregation.policy = parse_value("EPI_MAP_POLICY", &policy)?;
        }
        if let Some(bind_addr) = lookup("BIND_ADDR") {
            self.server.bind_addr = bind_addr;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_value("PORT", &port)?;
        }

        Ok(())
    }

    /// Builds the alias table: built-in aliases followed by the
    /// configured extras.
    ///
    /// # Errors
    ///
    /// * If an `[aliases]` key is not a canonical field name
    pub fn alias_table(&self) -> Result<AliasTable, ConfigError> {
        let mut extras: BTreeMap<CanonicalField, Vec<String>> = BTreeMap::new();
        for (key, aliases) in &self.aliases {
            let field: CanonicalField = key
                .parse()
                .map_err(|_| ConfigError::UnknownAliasField(key.clone()))?;
            extras.entry(field).or_default().extend(aliases.iter().cloned());
        }
        Ok(AliasTable::default().with_extras(&extras))
    }
}

/// Parses `value` for the variable or key `name`.
///
/// # Errors
///
/// * If `value` does not parse as `T`
pub fn parse_value<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    })
}
