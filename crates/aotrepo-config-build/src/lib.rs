//! Build-time configuration for repository contribution, read from
//! `aotrepo.toml`.
//!
//! ```toml
//! [repositories]
//! query-enhancer-selector = "default"
//! entity-manager-factory-ref = "entityManagerFactory"
//! ```


use aotrepo_core::{DEFAULT_ENTITY_MANAGER_FACTORY, query::QueryEnhancerSelector};
use serde::Deserialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

/// Conventional file name looked up next to a crate's manifest.
pub const CONFIG_FILE_NAME: &str = "aotrepo.toml";

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown query enhancer selector '{0}' (expected 'default' or 'regex')")]
    UnknownSelector(String),
}

///
/// AotConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AotConfig {
    #[serde(default)]
    pub repositories: RepositoriesConfig,
}

///
/// RepositoriesConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct RepositoriesConfig {
    /// Selector name; unset means the default selector.
    #[serde(default)]
    pub query_enhancer_selector: Option<String>,

    #[serde(default)]
    pub entity_manager_factory_ref: Option<String>,
}

impl AotConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    /// Load a config file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        Self::from_toml_str(&source)
    }

    /// Load `aotrepo.toml` from a crate directory.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load(dir.as_ref().join(CONFIG_FILE_NAME))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.query_enhancer_selector().map(|_| ())
    }

    /// The configured selector, or the default when unset.
    pub fn query_enhancer_selector(&self) -> Result<QueryEnhancerSelector, ConfigError> {
        match self.repositories.query_enhancer_selector.as_deref() {
            None => Ok(QueryEnhancerSelector::default()),
            Some(name) => QueryEnhancerSelector::parse(name)
                .ok_or_else(|| ConfigError::UnknownSelector(name.to_string())),
        }
    }

    /// Entity manager factory reference; `None` when unset, blank, or the
    /// default factory.
    #[must_use]
    pub fn entity_manager_factory_ref(&self) -> Option<&str> {
        self.repositories
            .entity_manager_factory_ref
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty() && *name != DEFAULT_ENTITY_MANAGER_FACTORY)
    }
}
