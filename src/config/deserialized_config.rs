//! Deserialized config module.
//!
//! This module reads and parses the TOML configuration file.

use dirs::{config_dir, home_dir};
use log::{debug, trace};
use std::{fs, path::PathBuf};

use super::{Config, ConfigError, Result};

const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

impl Config {
    /// Tries to create a config from an optional path.
    pub fn from_opt_path(path: Option<&str>) -> Result<Self> {
        trace!(">> parse config from path");
        debug!("path: {:?}", path);

        let path = match path {
            Some(path) => PathBuf::from(path),
            None => Self::path().ok_or(ConfigError::FindConfigFile)?,
        };
        let config = Self::from_toml_file(path)?;

        trace!("<< parse config from path");
        Ok(config)
    }

    /// Parses the config from a TOML string.
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn from_toml_file(path: PathBuf) -> Result<Self> {
        let content =
            fs::read_to_string(&path).map_err(|err| ConfigError::ReadConfigFile(err, path.clone()))?;
        let config =
            Self::from_toml_str(&content).map_err(|err| ConfigError::ParseConfigFile(err, path))?;
        trace!("config: {:?}", config);
        Ok(config)
    }

    /// Tries to get the config file path.
    ///
    /// The first existing file wins, in this order: the OS config
    /// directory, `~/.config`, then the `~/.aws-bridge.toml` dotfile.
    pub fn path() -> Option<PathBuf> {
        config_dir()
            .map(|p| p.join(PROJECT_NAME).join("config.toml"))
            .filter(|p| p.exists())
            .or_else(|| home_dir().map(|p| p.join(".config").join(PROJECT_NAME).join("config.toml")))
            .filter(|p| p.exists())
            .or_else(|| home_dir().map(|p| p.join(format!(".{}.toml", PROJECT_NAME))))
            .filter(|p| p.exists())
    }
}
