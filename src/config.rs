//! Nexarion Configuration
//!
//! Persistent settings for the persona runtime, read from TOML or JSON.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::emotion::EngineConfig;
use crate::errors::{NexarionError, Result};
use crate::persona::PersonaVariant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NexarionConfig {
    /// Emotional snapshot location; defaults to the data directory
    pub state_file: Option<PathBuf>,

    /// Seconds between background decay cycles
    pub tick_interval_secs: u64,

    /// Seconds between garden growth cycles (0 disables the garden)
    pub garden_interval_secs: u64,

    /// Save after this many interactions (0 disables)
    pub autosave_every: usize,

    /// Persona flavor
    pub variant: PersonaVariant,

    /// Engine tunables
    pub engine: EngineConfig,
}

impl Default for NexarionConfig {
    fn default() -> Self {
        Self {
            state_file: None,
            tick_interval_secs: 2,
            garden_interval_secs: 1,
            autosave_every: 5,
            variant: PersonaVariant::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl NexarionConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "nexarion", "nexarion")
    }

    /// Configuration directory
    pub fn config_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Data directory (emotional state, etc)
    pub fn data_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Default config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Where the emotional snapshot lives
    pub fn state_path(&self) -> PathBuf {
        self.state_file
            .clone()
            .or_else(|| Self::data_dir().map(|d| d.join("emotional_state.json")))
            .unwrap_or_else(|| PathBuf::from("data/emotional_state.json"))
    }
}

/// Loads the default config file, or defaults when it does not exist.
pub fn load_config() -> Result<NexarionConfig> {
    match NexarionConfig::config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(NexarionConfig::default()),
    }
}

/// Loads a config file. TOML by extension, JSON otherwise.
pub fn load_config_from(path: &Path) -> Result<NexarionConfig> {
    if !path.exists() {
        return Ok(NexarionConfig::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| NexarionError::config(format!("Failed to read config: {e}")))?;

    if path.extension().is_some_and(|e| e == "toml") {
        toml::from_str(&content).map_err(|e| NexarionError::config(format!("Invalid TOML config: {e}")))
    } else {
        serde_json::from_str(&content).map_err(|e| NexarionError::config(format!("Invalid JSON config: {e}")))
    }
}

/// Writes a config file, creating the directory if needed.
pub fn save_config_to(config: &NexarionConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| NexarionError::config(format!("Failed to create config dir: {e}")))?;
    }

    let content = if path.extension().is_some_and(|e| e == "toml") {
        toml::to_string_pretty(config)
            .map_err(|e| NexarionError::config(format!("Failed to serialize config: {e}")))?
    } else {
        serde_json::to_string_pretty(config)
            .map_err(|e| NexarionError::config(format!("Failed to serialize config: {e}")))?
    };

    fs::write(path, content).map_err(|e| NexarionError::config(format!("Failed to write config: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = NexarionConfig::default();
        assert_eq!(config.tick_interval_secs, 2);
        assert_eq!(config.autosave_every, 5);
        assert_eq!(config.variant, PersonaVariant::Unified);
        assert!((config.engine.decay_rate - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_config_from(&temp.path().join("config.toml")).unwrap();
        assert_eq!(config, NexarionConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "variant = \"security\"\nstate_file = \"/tmp/nex.json\"\n\n[engine]\nfluctuation_probability = 0.0\n",
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.variant, PersonaVariant::Security);
        assert_eq!(config.state_path(), PathBuf::from("/tmp/nex.json"));
        assert_eq!(config.engine.fluctuation_probability, 0.0);
        assert_eq!(config.engine.capacity, 5);
    }

    #[test]
    fn test_save_and_reload_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("conf").join("config.json");
        let config = NexarionConfig {
            autosave_every: 3,
            variant: PersonaVariant::UnifiedFixed,
            ..NexarionConfig::default()
        };
        save_config_to(&config, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "variant = [").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, NexarionError::ConfigurationError(_)));
    }
}
