use crate::error::{Result, RotatorError};
use crate::io::atomic_write;
use crate::paths;
use crate::types::OutfitRef;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_INTERVAL: u64 = 5;
/// One day. Longer intervals are clamped on load and rejected on save.
pub const MAX_INTERVAL: u64 = 86_400;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Persisted rotation settings (`config.json`).
///
/// The auto-start flag is not stored here; it is read from the OS entry
/// itself (see [`crate::autostart`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cookie: String,
    #[serde(default)]
    pub outfits: Vec<OutfitRef>,
    #[serde(default = "default_interval", deserialize_with = "deserialize_interval")]
    pub interval: u64,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL
}

/// Accept any integer and clamp into `1..=MAX_INTERVAL`.
fn deserialize_interval<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(clamp_interval(raw))
}

pub fn clamp_interval(raw: i64) -> u64 {
    raw.clamp(1, MAX_INTERVAL as i64) as u64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cookie: String::new(),
            outfits: Vec::new(),
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl Config {
    /// A rotation can start: there is a cookie and at least one outfit.
    pub fn is_ready(&self) -> bool {
        !self.cookie.trim().is_empty() && !self.outfits.is_empty()
    }

    /// Reject values the rotation loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.interval == 0 {
            return Err(RotatorError::InvalidConfig(
                "interval must be at least 1 second".into(),
            ));
        }
        if self.interval > MAX_INTERVAL {
            return Err(RotatorError::InvalidConfig(format!(
                "interval must be at most {MAX_INTERVAL} seconds"
            )));
        }
        let mut seen = HashSet::new();
        for outfit in &self.outfits {
            if !seen.insert(outfit.id) {
                return Err(RotatorError::InvalidConfig(format!(
                    "outfit {} is listed more than once",
                    outfit.id
                )));
            }
        }
        Ok(())
    }

    /// Cookie with everything but the last four characters hidden, for display.
    pub fn masked_cookie(&self) -> String {
        let chars: Vec<char> = self.cookie.chars().collect();
        if chars.is_empty() {
            return String::new();
        }
        let keep = chars.len().min(4);
        let tail: String = chars[chars.len() - keep..].iter().collect();
        format!("{}{}", "*".repeat(8), tail)
    }
}

// ---------------------------------------------------------------------------
// ConfigStore
// ---------------------------------------------------------------------------

/// Reads and writes the flat config file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config_dir>/avatar-rotator/config.json`.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(paths::default_config_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config. A missing file yields defaults; a malformed one is an error.
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = std::fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(Config::default());
        }
        let config = serde_json::from_str(&data)?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let data = serde_json::to_string_pretty(config)?;
        atomic_write(&self.path, data.as_bytes())?;
        info!(path = %self.path.display(), "Configuration saved.");
        Ok(())
    }
}
