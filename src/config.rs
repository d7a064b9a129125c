//! Non-secret preferences.
//!
//! Only plaintext metadata belongs here (default currency and the like) —
//! anything sensitive goes through the vault, never the config file.

use crate::store::Currency;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const CONFIG_ENV: &str = "SELAV_CONFIG";
const APP_DIR: &str = "selav";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug)]
pub enum ConfigError {
    ConfigDirUnavailable,
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ConfigDirUnavailable => {
                write!(f, "unable to determine configuration directory")
            }
            ConfigError::Io(err) => write!(f, "filesystem error: {err}"),
            ConfigError::Parse(err) => write!(f, "failed to parse config: {err}"),
            ConfigError::Serialize(err) => write!(f, "failed to serialize config: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Serialize(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_currency")]
    pub currency: Currency,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            currency: default_currency(),
        }
    }
}

fn default_currency() -> Currency {
    Currency::Usd
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    let mut dir = config_dir().ok_or(ConfigError::ConfigDirUnavailable)?;
    dir.push(APP_DIR);
    dir.push(CONFIG_FILE_NAME);
    Ok(dir)
}

pub fn load_preferences() -> Result<Preferences, ConfigError> {
    let path = config_path()?;
    load_preferences_from(&path)
}

fn load_preferences_from(path: &Path) -> Result<Preferences, ConfigError> {
    if !path.exists() {
        return Ok(Preferences::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&contents).map_err(ConfigError::Parse)
}

pub fn save_preferences(prefs: &Preferences) -> Result<(), ConfigError> {
    let path = config_path()?;
    save_preferences_to(&path, prefs)
}

fn save_preferences_to(path: &Path, prefs: &Preferences) -> Result<(), ConfigError> {
    let parent = path.parent().ok_or(ConfigError::ConfigDirUnavailable)?;
    fs::create_dir_all(parent).map_err(ConfigError::Io)?;

    let contents = toml::to_string_pretty(prefs).map_err(ConfigError::Serialize)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(ConfigError::Io)?;
    tmp.write_all(contents.as_bytes()).map_err(ConfigError::Io)?;
    tmp.persist(path)
        .map_err(|err| ConfigError::Io(err.error))?;
    Ok(())
}
