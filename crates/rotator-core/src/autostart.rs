//! Launch-at-login entry.
//!
//! On Windows this is a value under the per-user `Run` registry key. Everywhere
//! else it is an XDG autostart desktop entry.

use crate::error::Result;
use crate::io::atomic_write;
use crate::paths;
use std::path::{Path, PathBuf};
use tracing::info;

#[cfg(windows)]
const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";

#[derive(Debug, Clone)]
pub enum Autostart {
    /// `<dir>/avatar-rotator.desktop`
    DesktopEntry { path: PathBuf, command: String },
    /// `HKCU\...\Run\<name>`
    #[cfg(windows)]
    Registry { name: String, command: String },
}

impl Autostart {
    /// The platform's entry pointing at the running executable.
    pub fn for_current_exe() -> Result<Self> {
        let command = current_exe_command()?;

        #[cfg(windows)]
        {
            Ok(Autostart::Registry {
                name: paths::AUTOSTART_NAME.to_string(),
                command,
            })
        }
        #[cfg(not(windows))]
        {
            Ok(Self::desktop_entry(&paths::autostart_dir()?, command))
        }
    }

    pub fn desktop_entry(dir: &Path, command: impl Into<String>) -> Self {
        Autostart::DesktopEntry {
            path: dir.join(paths::AUTOSTART_DESKTOP_FILE),
            command: command.into(),
        }
    }

    /// Where the entry lives, for display.
    pub fn location(&self) -> String {
        match self {
            Autostart::DesktopEntry { path, .. } => path.display().to_string(),
            #[cfg(windows)]
            Autostart::Registry { name, .. } => format!(r"HKCU\{RUN_KEY}\{name}"),
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            Autostart::DesktopEntry { path, .. } => path.exists(),
            #[cfg(windows)]
            Autostart::Registry { name, .. } => registry::read(name).is_some(),
        }
    }

    /// Add or remove the entry. Removing an absent entry is a no-op.
    pub fn set_enabled(&self, enable: bool) -> Result<()> {
        match self {
            Autostart::DesktopEntry { path, command } => {
                if enable {
                    atomic_write(path, desktop_file(command).as_bytes())?;
                    info!(path = %path.display(), "Added to startup applications.");
                } else if path.exists() {
                    std::fs::remove_file(path)?;
                    info!(path = %path.display(), "Removed from startup applications.");
                }
                Ok(())
            }
            #[cfg(windows)]
            Autostart::Registry { name, command } => {
                if enable {
                    registry::write(name, command)?;
                    info!("Added to Windows Startup.");
                } else if registry::remove(name)? {
                    info!("Removed from Windows Startup.");
                }
                Ok(())
            }
        }
    }
}

/// Quoted path of the running executable, as written into the entry.
pub fn current_exe_command() -> Result<String> {
    let exe = std::env::current_exe()?;
    Ok(format!("\"{}\"", exe.display()))
}

fn desktop_file(command: &str) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=Avatar Rotator\n\
         Comment=Rotate your avatar through saved outfits\n\
         Exec={command}\n\
         Terminal=false\n\
         X-GNOME-Autostart-enabled=true\n"
    )
}

#[cfg(windows)]
mod registry {
    use super::*;
    use crate::error::RotatorError;
    use winreg::enums::{HKEY_CURRENT_USER, KEY_READ};
    use winreg::RegKey;

    pub fn read(name: &str) -> Option<String> {
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let key = hkcu.open_subkey_with_flags(RUN_KEY, KEY_READ).ok()?;
        key.get_value::<String, _>(name).ok()
    }

    pub fn write(name: &str, command: &str) -> Result<()> {
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let (key, _) = hkcu
            .create_subkey(RUN_KEY)
            .map_err(|e| RotatorError::Autostart(e.to_string()))?;
        key.set_value(name, &command.to_string())
            .map_err(|e| RotatorError::Autostart(e.to_string()))
    }

    /// Returns true if a value was removed.
    pub fn remove(name: &str) -> Result<bool> {
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let (key, _) = hkcu
            .create_subkey(RUN_KEY)
            .map_err(|e| RotatorError::Autostart(e.to_string()))?;
        match key.delete_value(name) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(RotatorError::Autostart(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn desktop_entry_enable_disable() {
        let dir = TempDir::new().unwrap();
        let entry = Autostart::desktop_entry(dir.path(), "\"/usr/bin/avatar-rotator\"");
        assert!(!entry.is_enabled());

        entry.set_enabled(true).unwrap();
        assert!(entry.is_enabled());
        let contents =
            std::fs::read_to_string(dir.path().join(paths::AUTOSTART_DESKTOP_FILE)).unwrap();
        assert!(contents.contains("Exec=\"/usr/bin/avatar-rotator\""));

        entry.set_enabled(false).unwrap();
        assert!(!entry.is_enabled());
    }

    #[test]
    fn disabling_absent_entry_is_noop() {
        let dir = TempDir::new().unwrap();
        let entry = Autostart::desktop_entry(dir.path(), "rotator");
        entry.set_enabled(false).unwrap();
        assert!(!entry.is_enabled());
    }

    #[test]
    fn enable_creates_missing_autostart_dir() {
        let dir = TempDir::new().unwrap();
        let entry = Autostart::desktop_entry(&dir.path().join("autostart"), "rotator");
        entry.set_enabled(true).unwrap();
        assert!(entry.is_enabled());
    }
}
