//! Configuration management for the launcher log

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default name of the active log file
pub const DEFAULT_LOG_FILE_NAME: &str = "yam_launcher.log";

/// Rotate once the active file grows past this many bytes (5 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Rotate once more than this many entries were written since the last rotation/open
pub const DEFAULT_MAX_ENTRIES: usize = 5000;

/// Device and build details written into every session header
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionInfo {
    /// Product name shown in the header title line
    pub product: String,
    /// Host application version
    pub app_version: String,
    /// Platform (OS) release string
    pub platform_version: String,
    /// Platform API level
    pub api_level: u32,
    /// Device manufacturer
    pub manufacturer: String,
    /// Device model
    pub model: String,
}

impl Default for SessionInfo {
    fn default() -> Self {
        Self {
            product: "YAM Launcher".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            platform_version: std::env::consts::OS.to_string(),
            api_level: 0,
            manufacturer: "unknown".to_string(),
            model: std::env::consts::ARCH.to_string(),
        }
    }
}

/// Logger configuration
///
/// Thresholds are read once when the logger is constructed; a running logger
/// is never reconfigured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Directory holding the active log file and its backup
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Name of the active log file; the backup gets an `.old` suffix
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Size threshold in bytes (default: 5 MiB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Entry-count threshold since the last rotation/open (default: 5000)
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Mirror every entry to stderr synchronously
    #[serde(default = "default_console_mirror")]
    pub console_mirror: bool,

    /// Header details
    #[serde(default)]
    pub session: SessionInfo,
}

fn default_log_dir() -> PathBuf {
    config_dir()
}

fn default_file_name() -> String {
    DEFAULT_LOG_FILE_NAME.to_string()
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

fn default_console_mirror() -> bool {
    true
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            file_name: default_file_name(),
            max_file_size: default_max_file_size(),
            max_entries: default_max_entries(),
            console_mirror: default_console_mirror(),
            session: SessionInfo::default(),
        }
    }
}

impl LoggerConfig {
    /// Default configuration rooted at a custom directory
    pub fn with_dir(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from the default config file, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific file, or return default if not found
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Path of the active log file
    pub fn log_file_path(&self) -> PathBuf {
        self.log_dir.join(&self.file_name)
    }

    /// Path of the single rotated backup
    pub fn backup_file_path(&self) -> PathBuf {
        self.log_dir.join(format!("{}.old", self.file_name))
    }
}

/// Get the process-private data directory (<data dir>/yamlauncher)
/// Falls back to ./.yamlauncher if no data directory can be determined
pub fn config_dir() -> PathBuf {
    try_config_dir().unwrap_or_else(|| {
        tracing::warn!("Could not determine data directory, using current directory for logs");
        PathBuf::from(".yamlauncher")
    })
}

/// Try to get the data directory, returning None if it is unavailable
pub fn try_config_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("yamlauncher"))
}

/// Get the path to the config file
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = LoggerConfig::default();
        assert_eq!(config.file_name, "yam_launcher.log");
        assert_eq!(config.max_file_size, 5 * 1024 * 1024);
        assert_eq!(config.max_entries, 5000);
        assert!(config.console_mirror);
    }

    #[test]
    fn test_config_serialization() {
        let config = LoggerConfig::with_dir("/tmp/yam");
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: LoggerConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.log_dir, PathBuf::from("/tmp/yam"));
        assert_eq!(parsed.max_entries, config.max_entries);
        assert_eq!(parsed.session, config.session);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: LoggerConfig = toml::from_str(
            r#"
            log_dir = "/var/lib/yam"
            max_entries = 10

            [session]
            manufacturer = "Fairphone"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.max_entries, 10);
        assert_eq!(parsed.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert_eq!(parsed.file_name, DEFAULT_LOG_FILE_NAME);
        assert_eq!(parsed.session.manufacturer, "Fairphone");
        assert_eq!(parsed.session.product, "YAM Launcher");
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = LoggerConfig::load_from(&temp_dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.max_entries, DEFAULT_MAX_ENTRIES);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = LoggerConfig::with_dir(temp_dir.path());
        config.max_entries = 42;
        config.console_mirror = false;
        config.save_to(&path).unwrap();

        let loaded = LoggerConfig::load_from(&path).unwrap();
        assert_eq!(loaded.max_entries, 42);
        assert!(!loaded.console_mirror);
    }

    #[test]
    fn test_load_invalid_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "max_entries = \"lots\"").unwrap();

        assert!(LoggerConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_log_paths() {
        let config = LoggerConfig::with_dir("/data/yam");
        assert_eq!(config.log_file_path(), PathBuf::from("/data/yam/yam_launcher.log"));
        assert_eq!(
            config.backup_file_path(),
            PathBuf::from("/data/yam/yam_launcher.log.old")
        );
    }

    #[test]
    fn test_config_dir_does_not_panic() {
        let dir = config_dir();
        assert!(dir.ends_with("yamlauncher") || dir.ends_with(".yamlauncher"));
    }
}
