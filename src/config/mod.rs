use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    errors::ApuError,
    number::{detect_number_format, NumberFormat},
    storage::{DEFAULT_DEBOUNCE, DEFAULT_RETENTION},
    utils::{app_data_dir, config_file_in, ensure_dir, projects_dir_in, write_atomic},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub locale: String,
    /// Overrides the format derived from `locale`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_format: Option<NumberFormat>,
    pub save_debounce_ms: u64,
    pub backup_retention: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_project: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            number_format: None,
            save_debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            backup_retention: DEFAULT_RETENTION,
            last_project: None,
        }
    }
}

impl AppConfig {
    /// Separator mode for new projects.
    pub fn number_format(&self) -> NumberFormat {
        self.number_format
            .unwrap_or_else(|| detect_number_format(&self.locale))
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}

/// Reads and writes `config.json` under the data directory.
pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ApuError> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ApuError> {
        ensure_dir(&base)?;
        Ok(Self {
            path: config_file_in(&base),
            base,
        })
    }

    /// Missing file → defaults. A file that does not parse is an error
    /// rather than being silently replaced.
    pub fn load(&self) -> Result<AppConfig, ApuError> {
        if !self.path.exists() {
            return Ok(AppConfig::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data).map_err(|err| {
            ApuError::Config(format!("{}: {err}", self.path.display()))
        })
    }

    pub fn save(&self, config: &AppConfig) -> Result<(), ApuError> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn projects_dir(&self) -> PathBuf {
        projects_dir_in(&self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_defaults() {
        let temp = TempDir::new().expect("temp dir");
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).expect("manager");
        let config = manager.load().expect("load");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.save_debounce(), Duration::from_millis(1500));
        assert_eq!(config.number_format(), NumberFormat::Latam);
    }

    #[test]
    fn save_then_load_roundtrip() {
        let temp = TempDir::new().expect("temp dir");
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).expect("manager");
        let config = AppConfig {
            locale: "de-DE".into(),
            backup_retention: 2,
            last_project: Some("obra".into()),
            ..AppConfig::default()
        };
        manager.save(&config).expect("save");
        let loaded = manager.load().expect("load");
        assert_eq!(loaded, config);
        assert_eq!(loaded.number_format(), NumberFormat::Euro);
    }

    #[test]
    fn partial_file_fills_defaults_and_override_wins() {
        let temp = TempDir::new().expect("temp dir");
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).expect("manager");
        fs::write(manager.path(), r#"{"locale": "fr-FR", "number_format": "raw"}"#).expect("seed");
        let loaded = manager.load().expect("load");
        assert_eq!(loaded.backup_retention, DEFAULT_RETENTION);
        assert_eq!(loaded.number_format(), NumberFormat::Raw);
    }

    #[test]
    fn corrupt_file_is_a_config_error() {
        let temp = TempDir::new().expect("temp dir");
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).expect("manager");
        fs::write(manager.path(), "{ nope").expect("seed");
        assert!(matches!(manager.load(), Err(ApuError::Config(_))));
    }
}
