use crate::error::{Inv365Error, Result};
use crate::graph::GRAPH_API_BASE;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_PATH: &str = "DeviceReport.html";

/// Intune admin center device overview. `{id}` is the managed device id.
pub const DEFAULT_INTUNE_DEVICE_URL: &str = "https://intune.microsoft.com/#view/Microsoft_Intune_Devices/DeviceSettingsMenuBlade/~/overview/mdmDeviceId/{id}";

/// Entra admin center device properties. `{id}` is the directory object id.
pub const DEFAULT_ENTRA_DEVICE_URL: &str = "https://entra.microsoft.com/#view/Microsoft_AAD_Devices/DeviceDetailsMenuBlade/~/Properties/objectId/{id}";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_graph_base_url")]
    pub graph_base_url: String,

    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    #[serde(default = "default_intune_device_url")]
    pub intune_device_url: String,

    #[serde(default = "default_entra_device_url")]
    pub entra_device_url: String,

    /// Look up the primary user of every Intune-matched device
    #[serde(default = "default_true")]
    pub include_primary_users: bool,

    #[serde(default)]
    pub log_level: String,
}

fn default_graph_base_url() -> String {
    GRAPH_API_BASE.to_string()
}

fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}

fn default_intune_device_url() -> String {
    DEFAULT_INTUNE_DEVICE_URL.to_string()
}

fn default_entra_device_url() -> String {
    DEFAULT_ENTRA_DEVICE_URL.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            graph_base_url: default_graph_base_url(),
            output_path: default_output_path(),
            intune_device_url: default_intune_device_url(),
            entra_device_url: default_entra_device_url(),
            include_primary_users: true,
            log_level: String::new(),
        }
    }
}

/// Configuration manager
#[derive(Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let project_dirs = ProjectDirs::from("com", "inv365", "inv365").ok_or_else(|| {
            Inv365Error::ConfigError("Failed to determine config directory".into())
        })?;

        Ok(Self::with_dir(project_dirs.config_dir()))
    }

    /// Use an explicit config directory instead of the platform default
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            config_dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Load main config, falling back to defaults when no file exists
    pub fn load_config(&self) -> Result<Config> {
        let config_path = self.config_file();

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save main config
    pub fn save_config(&self, config: &Config) -> Result<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir)?;
        }

        let contents = toml::to_string_pretty(config)
            .map_err(|e| Inv365Error::ConfigError(format!("Failed to serialize config: {}", e)))?;
        fs::write(self.config_file(), contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("inv365-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let manager = ConfigManager::with_dir(scratch_dir("missing"));
        let config = manager.load_config().unwrap();
        assert_eq!(config.graph_base_url, GRAPH_API_BASE);
        assert_eq!(config.output_path, PathBuf::from(DEFAULT_OUTPUT_PATH));
        assert!(config.include_primary_users);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = scratch_dir("partial");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("config.toml"),
            "output_path = \"out/devices.html\"\ninclude_primary_users = false\n",
        )
        .unwrap();

        let config = ConfigManager::with_dir(&dir).load_config().unwrap();
        assert_eq!(config.output_path, PathBuf::from("out/devices.html"));
        assert!(!config.include_primary_users);
        assert_eq!(config.intune_device_url, DEFAULT_INTUNE_DEVICE_URL);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_then_load() {
        let dir = scratch_dir("save");
        let manager = ConfigManager::with_dir(&dir);
        let config = Config {
            graph_base_url: "https://graph.microsoft.com/beta".into(),
            ..Config::default()
        };
        manager.save_config(&config).unwrap();

        let loaded = manager.load_config().unwrap();
        assert_eq!(loaded.graph_base_url, "https://graph.microsoft.com/beta");

        let _ = fs::remove_dir_all(&dir);
    }
}
