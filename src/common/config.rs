//! Configuration for the init container

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory MariaDB reads `*.cnf` includes from
pub const DEFAULT_CONFIG_DIR: &str = "/etc/mysql/mariadb.conf.d";

/// MariaDB data directory, where Galera keeps its state files
pub const DEFAULT_STATE_DIR: &str = "/var/lib/mysql";

/// Prefix for environment overrides (`GALERA_INIT_STATE_DIR=...`)
pub const ENV_PREFIX: &str = "GALERA_INIT";

/// Init container configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitConfig {
    /// The directory that contains MariaDB configuration files
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// The directory that contains MariaDB state files
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_config_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_DIR)
}
fn default_state_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_DIR)
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            state_dir: default_state_dir(),
            log_level: default_log_level(),
        }
    }
}

impl InitConfig {
    /// Load configuration: defaults, then an optional TOML file, then
    /// `GALERA_INIT_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder()
            .set_default("config_dir", DEFAULT_CONFIG_DIR)?
            .set_default("state_dir", DEFAULT_STATE_DIR)?
            .set_default("log_level", default_log_level())?;

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        builder = builder.add_source(::config::Environment::with_prefix(ENV_PREFIX));

        let config: InitConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides on top of the loaded values
    pub fn with_overrides(
        mut self,
        config_dir: Option<PathBuf>,
        state_dir: Option<PathBuf>,
        log_level: Option<String>,
    ) -> Result<Self> {
        if let Some(dir) = config_dir {
            self.config_dir = dir;
        }
        if let Some(dir) = state_dir {
            self.state_dir = dir;
        }
        if let Some(level) = log_level {
            self.log_level = level;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.config_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("config_dir cannot be empty".into()));
        }
        if self.state_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("state_dir cannot be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = InitConfig::default();
        assert_eq!(config.config_dir, PathBuf::from("/etc/mysql/mariadb.conf.d"));
        assert_eq!(config.state_dir, PathBuf::from("/var/lib/mysql"));
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("galera-init.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "state_dir = \"/data/mysql\"").unwrap();
        writeln!(file, "log_level = \"debug\"").unwrap();

        let config = InitConfig::load(Some(&path)).unwrap();
        assert_eq!(config.config_dir, PathBuf::from(DEFAULT_CONFIG_DIR));
        assert_eq!(config.state_dir, PathBuf::from("/data/mysql"));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(InitConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = InitConfig::default()
            .with_overrides(Some(PathBuf::from("/tmp/conf.d")), None, None)
            .unwrap();
        assert_eq!(config.config_dir, PathBuf::from("/tmp/conf.d"));
        assert_eq!(config.state_dir, PathBuf::from(DEFAULT_STATE_DIR));

        let invalid = InitConfig::default().with_overrides(None, Some(PathBuf::new()), None);
        assert!(matches!(invalid, Err(Error::InvalidConfig(_))));
    }
}
