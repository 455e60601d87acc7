use std::{path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{debug, warn};

/// Settings read from `<config dir>/reflect/config.toml`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub journal_dir: PathBuf,
    /// gzip level used when sealing, 1 to 9.
    pub compression_level: u32,
    pub search_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            journal_dir: dirs::data_dir()
                .map(|dir| dir.join("reflect"))
                .unwrap_or_else(|| PathBuf::from("journal")),
            compression_level: 6,
            search_delay_ms: 500,
        }
    }
}

impl Config {
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("reflect").join("config.toml"))
    }

    /// Never fails: a missing file is silent and a malformed one is logged,
    /// both falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Self::default();
            }
        };

        Self::parse(&raw).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "config parse error, using defaults");
            Self::default()
        })
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(raw)?;
        config.compression_level = config.compression_level.clamp(1, 9);
        Ok(config)
    }

    pub fn search_delay(&self) -> Duration {
        Duration::from_millis(self.search_delay_ms)
    }
}
