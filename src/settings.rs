use crate::store::{StoreOptions, SNAPSHOTS_FILE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// File holding captured layouts. Relative paths are resolved against
    /// the directory of the settings file.
    #[serde(default = "default_snapshots_file")]
    pub snapshots_file: String,
    /// How long closing the store waits for pending writes.
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,
    /// When enabled the application initialises the logger at debug level.
    /// Defaults to `false` when the field is missing in the settings file.
    #[serde(default)]
    pub debug_logging: bool,
    /// Optional log file. Logs go to stdout only when unset.
    #[serde(default)]
    pub log_file: Option<String>,
}

fn default_snapshots_file() -> String {
    SNAPSHOTS_FILE.into()
}

fn default_close_timeout_ms() -> u64 {
    5_000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            snapshots_file: default_snapshots_file(),
            close_timeout_ms: default_close_timeout_ms(),
            debug_logging: false,
            log_file: None,
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn snapshots_path(&self, settings_path: &Path) -> PathBuf {
        resolve_relative(settings_path, &self.snapshots_file)
    }

    pub fn log_path(&self, settings_path: &Path) -> Option<PathBuf> {
        self.log_file
            .as_deref()
            .map(|file| resolve_relative(settings_path, file))
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            close_timeout: Duration::from_millis(self.close_timeout_ms),
        }
    }
}

fn resolve_relative(settings_path: &Path, file: &str) -> PathBuf {
    let file = Path::new(file);
    if file.is_absolute() {
        return file.to_path_buf();
    }
    let base_dir = settings_path.parent().unwrap_or_else(|| Path::new("."));
    base_dir.join(file)
}
