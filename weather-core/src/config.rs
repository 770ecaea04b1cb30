use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

/// User preferences stored on disk.
///
/// Example TOML:
/// ```toml
/// default_city = "Lisbon"
/// request_timeout_secs = 10
/// suggestion_limit = 5
/// suggestion_min_chars = 3
/// debounce_ms = 300
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// City shown when no query is given.
    pub default_city: String,

    /// Per-request timeout for geocoding and forecast calls.
    pub request_timeout_secs: u64,

    /// How many candidates the autocomplete lists.
    pub suggestion_limit: usize,

    /// Shorter input gets no suggestions.
    pub suggestion_min_chars: usize,

    /// Quiet period before a typed query triggers a suggestion lookup.
    pub debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_city: "London".to_string(),
            request_timeout_secs: 10,
            suggestion_limit: 5,
            suggestion_min_chars: 3,
            debounce_ms: 300,
        }
    }
}

impl Config {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_city.trim().is_empty() {
            return Err(anyhow!("default_city must not be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be at least 1"));
        }
        if self.suggestion_limit == 0 {
            return Err(anyhow!("suggestion_limit must be at least 1"));
        }
        Ok(())
    }
}
