use crate::error::{Result, RotatorError};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Names and constants
// ---------------------------------------------------------------------------

pub const APP_DIR: &str = "avatar-rotator";
pub const CONFIG_FILE: &str = "config.json";
pub const LOG_FILE: &str = "rotator.log";

/// Name of the OS auto-start entry (registry value / desktop entry).
pub const AUTOSTART_NAME: &str = "AvatarRotator";
pub const AUTOSTART_DESKTOP_FILE: &str = "avatar-rotator.desktop";

pub const DEFAULT_PORT: u16 = 5847;

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `<config_dir>/avatar-rotator`
pub fn app_config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or(RotatorError::ConfigDirNotFound)?;
    Ok(base.join(APP_DIR))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(app_config_dir()?.join(CONFIG_FILE))
}

/// Log file lives next to other per-user app data; falls back to the config dir.
pub fn default_log_path() -> Result<PathBuf> {
    match dirs::data_local_dir() {
        Some(base) => Ok(base.join(APP_DIR).join(LOG_FILE)),
        None => Ok(app_config_dir()?.join(LOG_FILE)),
    }
}

/// XDG autostart directory (`$XDG_CONFIG_HOME/autostart`).
pub fn autostart_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or(RotatorError::ConfigDirNotFound)?;
    Ok(base.join("autostart"))
}

pub fn control_url(port: u16) -> String {
    format!("http://127.0.0.1:{port}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_url_uses_loopback() {
        assert_eq!(control_url(DEFAULT_PORT), "http://127.0.0.1:5847");
    }

    #[test]
    fn default_paths_live_under_app_dir() {
        if let Ok(path) = default_config_path() {
            assert!(path.ends_with("avatar-rotator/config.json"));
        }
        if let Ok(path) = default_log_path() {
            assert!(path.ends_with("avatar-rotator/rotator.log"));
        }
    }
}
