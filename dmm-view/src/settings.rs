//! Application settings

use std::path::{Path, PathBuf};

use dmm_sim::VirtualMeterConfig;
use serde::{Deserialize, Serialize};

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Directory searched for calibration documents before the built-in ones
    #[serde(default)]
    pub calibration_dir: Option<PathBuf>,
    /// Meter variant, selects `funOl_<variant>.json`
    #[serde(default = "default_variant")]
    pub variant: String,
    /// Name shown for the meter
    #[serde(default = "default_variant")]
    pub pair_name: String,
    /// Interval between simulated frames in milliseconds
    #[serde(default = "default_simulate_interval")]
    pub simulate_interval_ms: u64,
    /// Virtual meter used by `simulate`
    #[serde(default)]
    pub virtual_meter: VirtualMeterConfig,
}

fn default_variant() -> String {
    "UT61E+".to_string()
}

fn default_simulate_interval() -> u64 {
    500
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            calibration_dir: None,
            variant: default_variant(),
            pair_name: default_variant(),
            simulate_interval_ms: default_simulate_interval(),
            virtual_meter: VirtualMeterConfig::default(),
        }
    }
}

impl Settings {
    /// Get the XDG config directory for dmmview
    /// Uses $XDG_CONFIG_HOME/dmmview on Linux/macOS, falls back to ~/.config/dmmview
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("dmmview"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("dmmview"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load settings from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&text) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to parse settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<PathBuf, String> {
        let path =
            Self::settings_path().ok_or_else(|| "Could not determine settings path".to_string())?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create settings directory: {}", e))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        std::fs::write(path, json).map_err(|e| format!("Failed to write settings: {}", e))?;

        Ok(())
    }
}
