use std::fs;
use std::path::{Path, PathBuf};

use nr_core::error::RedirectError;
use nr_core::settings::{ChangeListener, Listeners, Settings, SettingsChange, SettingsStore};

const APP_PREFIX: &str = "nitter-redirect";
const SETTINGS_FILE: &str = "settings.json";

/// `$XDG_CONFIG_HOME/nitter-redirect/settings.json`
pub fn default_settings_path() -> Result<PathBuf, String> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_PREFIX)
        .map_err(|e| format!("Failed to locate config directory: {}", e))?;
    Ok(xdg_dirs.get_config_home().join(SETTINGS_FILE))
}

/// Settings persisted as a JSON file. A missing file reads as defaults.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    listeners: Listeners,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            listeners: Listeners::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, settings: &Settings) -> Result<(), RedirectError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                RedirectError::SettingsAccess(format!(
                    "Failed to create '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        let json = serde_json::to_string_pretty(settings).map_err(|e| {
            RedirectError::SettingsAccess(format!("Failed to encode settings: {}", e))
        })?;
        fs::write(&self.path, json).map_err(|e| {
            RedirectError::SettingsAccess(format!(
                "Failed to write '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self) -> Result<Settings, RedirectError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::default()),
            Err(e) => {
                return Err(RedirectError::SettingsAccess(format!(
                    "Failed to read '{}': {}",
                    self.path.display(),
                    e
                )))
            }
        };
        serde_json::from_str(&text).map_err(|e| {
            RedirectError::SettingsAccess(format!(
                "Failed to parse '{}': {}",
                self.path.display(),
                e
            ))
        })
    }

    fn set(&mut self, change: &SettingsChange) -> Result<(), RedirectError> {
        let current = self.get()?;
        let mut next = current.clone();
        next.apply(change);
        self.write(&next)?;
        self.listeners.notify(&current.diff(&next));
        Ok(())
    }

    fn subscribe(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }
}
