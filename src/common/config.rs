use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_STORAGE_KEY: &str = "cachegate_version";
pub const DEFAULT_MIN_DISPLAY_MS: u64 = 1500;
pub const DEFAULT_CACHE_BUST_PARAM: &str = "_cb";
pub const DEFAULT_SELF_SCRIPT_MARKER: &str = "cachegate";
pub const DEFAULT_OPT_OUT_ATTRIBUTE: &str = "data-no-cache-bust";

/// Settings a clearer is built with. Fixed for the lifetime of the clearer,
/// except the target version which `update_version` may overwrite.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearerConfig {
    /// Version the page should be cleared for
    pub target_version: String,

    /// Durable-store key that holds the version marker
    pub storage_key: String,

    /// Log step failures and progress
    pub diagnostics: bool,

    /// Minimum time the progress indicator stays visible
    pub min_display: Duration,

    /// Query parameter appended to asset URLs
    pub cache_bust_param: String,

    /// Scripts whose src contains this are left alone
    pub self_script_marker: String,

    /// Elements carrying this attribute are never cache-busted
    pub opt_out_attribute: String,
}

impl ClearerConfig {
    pub fn new(target_version: impl Into<String>) -> Self {
        Self {
            target_version: target_version.into(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            diagnostics: false,
            min_display: Duration::from_millis(DEFAULT_MIN_DISPLAY_MS),
            cache_bust_param: DEFAULT_CACHE_BUST_PARAM.to_string(),
            self_script_marker: DEFAULT_SELF_SCRIPT_MARKER.to_string(),
            opt_out_attribute: DEFAULT_OPT_OUT_ATTRIBUTE.to_string(),
        }
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_diagnostics(mut self, on: bool) -> Self {
        self.diagnostics = on;
        self
    }

    pub fn with_min_display(mut self, min_display: Duration) -> Self {
        self.min_display = min_display;
        self
    }
}

/// Global cachegate configuration, persisted as TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Version pages are cleared for
    #[serde(default = "default_target_version")]
    pub target_version: String,

    /// Marker key in the durable store
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Diagnostic logging of step failures
    #[serde(default)]
    pub diagnostics: bool,

    /// Minimum progress display in milliseconds
    #[serde(default = "default_min_display_ms")]
    pub min_display_ms: u64,

    #[serde(default = "default_cache_bust_param")]
    pub cache_bust_param: String,

    #[serde(default = "default_self_script_marker")]
    pub self_script_marker: String,

    #[serde(default = "default_opt_out_attribute")]
    pub opt_out_attribute: String,
}

fn default_target_version() -> String {
    "1.0.0".to_string()
}
fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}
fn default_min_display_ms() -> u64 {
    DEFAULT_MIN_DISPLAY_MS
}
fn default_cache_bust_param() -> String {
    DEFAULT_CACHE_BUST_PARAM.to_string()
}
fn default_self_script_marker() -> String {
    DEFAULT_SELF_SCRIPT_MARKER.to_string()
}
fn default_opt_out_attribute() -> String {
    DEFAULT_OPT_OUT_ATTRIBUTE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_version: default_target_version(),
            storage_key: default_storage_key(),
            diagnostics: false,
            min_display_ms: default_min_display_ms(),
            cache_bust_param: default_cache_bust_param(),
            self_script_marker: default_self_script_marker(),
            opt_out_attribute: default_opt_out_attribute(),
        }
    }
}

impl Config {
    /// Get the cachegate data directory (~/.cachegate)
    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".cachegate")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Load config from file, or fall back to defaults if not present
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        let dir = Self::data_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config dir: {}", dir.display()))?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Apply a `config set` assignment
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "target_version" => self.target_version = value.to_string(),
            "diagnostics" => self.diagnostics = value.parse()?,
            "min_display_ms" => self.min_display_ms = value.parse()?,
            "storage_key" | "cache_bust_param" | "self_script_marker" | "opt_out_attribute" => {
                if value.is_empty() {
                    anyhow::bail!("{} cannot be empty", key);
                }
                let slot = match key {
                    "storage_key" => &mut self.storage_key,
                    "cache_bust_param" => &mut self.cache_bust_param,
                    "self_script_marker" => &mut self.self_script_marker,
                    _ => &mut self.opt_out_attribute,
                };
                *slot = value.to_string();
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Build the clearer settings, optionally overriding the target version
    pub fn clearer_config(&self, target_override: Option<&str>) -> ClearerConfig {
        ClearerConfig {
            target_version: target_override
                .unwrap_or(&self.target_version)
                .to_string(),
            storage_key: self.storage_key.clone(),
            diagnostics: self.diagnostics,
            min_display: Duration::from_millis(self.min_display_ms),
            cache_bust_param: self.cache_bust_param.clone(),
            self_script_marker: self.self_script_marker.clone(),
            opt_out_attribute: self.opt_out_attribute.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("target_version = \"V2.1\"").unwrap();
        assert_eq!(config.target_version, "V2.1");
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.min_display_ms, DEFAULT_MIN_DISPLAY_MS);
        assert!(!config.diagnostics);
    }

    #[test]
    fn test_set_rejects_unknown_key() {
        let mut config = Config::default();
        assert!(config.set("nope", "1").is_err());
        config.set("diagnostics", "true").unwrap();
        assert!(config.diagnostics);
    }

    #[test]
    fn test_set_rejects_empty_names() {
        let mut config = Config::default();
        for key in ["storage_key", "cache_bust_param", "self_script_marker", "opt_out_attribute"] {
            assert!(config.set(key, "").is_err(), "{} accepted an empty value", key);
        }
        assert_eq!(config.cache_bust_param, DEFAULT_CACHE_BUST_PARAM);
        assert_eq!(config.self_script_marker, DEFAULT_SELF_SCRIPT_MARKER);

        config.set("cache_bust_param", "v").unwrap();
        assert_eq!(config.cache_bust_param, "v");
    }

    #[test]
    fn test_target_override() {
        let config = Config::default();
        let clearer = config.clearer_config(Some("V9"));
        assert_eq!(clearer.target_version, "V9");
        assert_eq!(clearer.min_display, Duration::from_millis(1500));
    }
}
