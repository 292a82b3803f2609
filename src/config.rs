//! Analysis configuration.
//!
//! Settings come from an optional TOML file, overridden by `RESTPROBE__*`
//! environment variables. Every key has a default, so an empty file (or no
//! file at all) yields [`AnalysisConfig::default`].

use config::{Config, ConfigError as SourceError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default exception reported by the finder heuristic.
pub const DEFAULT_FINDER_EXCEPTION: &str = "jakarta.persistence.EntityNotFoundException";

/// Errors that can occur when loading the analysis configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] SourceError),

    #[error("invalid configuration path: {0}")]
    InvalidPath(String),

    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// An extra knowledge-base row from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeOverride {
    pub exception: String,
    pub status: u16,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Instructions searched around an unwrap-or-throw for its supplier
    pub unwrap_window: usize,
    pub finder_heuristic: bool,
    pub finder_exception: String,
    /// Emit failures the web framework raises while binding parameters
    pub framework_failures: bool,
    /// Resolve handler methods on the rayon thread pool
    pub parallel: bool,
    /// Base interfaces that mark implementors as data access, beyond the built-in ones
    pub data_access_interfaces: Vec<String>,
    pub knowledge_base: Vec<KnowledgeOverride>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            unwrap_window: 12,
            finder_heuristic: true,
            finder_exception: DEFAULT_FINDER_EXCEPTION.to_string(),
            framework_failures: true,
            parallel: false,
            data_access_interfaces: Vec::new(),
            knowledge_base: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// Loads configuration from a TOML file with environment overrides.
    ///
    /// Environment variables use the `RESTPROBE__<KEY>` form, e.g.
    /// `RESTPROBE__PARALLEL=true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, the path is not valid
    /// UTF-8, or the contents do not parse.
    ///
    /// ```no_run
    /// use restprobe::config::AnalysisConfig;
    ///
    /// let config = AnalysisConfig::load("restprobe.toml")?;
    /// # Ok::<(), restprobe::config::ConfigError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError::InvalidPath(format!("{:?}", path)))?;
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path_str.to_string()));
        }

        let config = Config::builder()
            .add_source(File::with_name(path_str))
            .add_source(env_source())
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Defaults with environment overrides only.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Config::builder().add_source(env_source()).build()?;
        Ok(config.try_deserialize()?)
    }
}

impl AnalysisConfig {
    /// The configuration as a TOML document that [`AnalysisConfig::load`] accepts.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("RESTPROBE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
