//! Configuration file parsing for Brigade
//!
//! Parses `brigade.toml` using serde. The only tunable is the bridge
//! count, fixed at load time; a missing file means defaults.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Bridges created when no configuration is given
pub const DEFAULT_NUM_BRIDGES: usize = 1;

/// Upper bound on the configurable bridge count
pub const MAX_BRIDGES: usize = 1024;

/// Load-time configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Number of bridges to create at bring-up
    #[serde(default = "default_num_bridges")]
    pub num_bridges: usize,
}

fn default_num_bridges() -> usize {
    DEFAULT_NUM_BRIDGES
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_bridges: DEFAULT_NUM_BRIDGES,
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.num_bridges > MAX_BRIDGES {
            return Err(Error::ConfigValidation(format!(
                "num_bridges {} exceeds the maximum of {}",
                self.num_bridges, MAX_BRIDGES
            )));
        }
        Ok(())
    }
}

/// Load configuration from a file, falling back to defaults if it is absent
pub fn load(path: &Path) -> Result<Config> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        Err(e) => {
            return Err(Error::ConfigRead {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_one_bridge() {
        let config = Config::default();
        assert_eq!(config.num_bridges, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_num_bridges() {
        let config: Config = toml::from_str("num_bridges = 4").unwrap();
        assert_eq!(config.num_bridges, 4);
    }

    #[test]
    fn test_parse_empty_uses_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.num_bridges, DEFAULT_NUM_BRIDGES);
    }

    #[test]
    fn test_validate_rejects_excessive_count() {
        let config = Config {
            num_bridges: MAX_BRIDGES + 1,
        };
        assert!(matches!(
            config.validate(),
            Err(Error::ConfigValidation(_))
        ));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load(Path::new("/nonexistent/brigade.toml")).unwrap();
        assert_eq!(config.num_bridges, DEFAULT_NUM_BRIDGES);
    }
}
