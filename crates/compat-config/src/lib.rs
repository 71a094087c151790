//! # compat-config
//!
//! Configuration management for the compat shims.
//!
//! Loads configuration from:
//! 1. `~/.compat/config.toml` (global)
//! 2. `.compat/config.toml` (project-local, overrides global)
//! 3. Environment variables (highest priority)

pub mod logging;
pub mod testing;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard};
use tracing::debug;

pub use logging::{init_logging, LogLevel};

/// Fixed capacity of the thread-specific destructor registry.
pub const TSS_REGISTRY_MAX: usize = 1024;

/// Global config instance
static CONFIG: Lazy<RwLock<Config>> = Lazy::new(|| RwLock::new(Config::load().unwrap_or_default()));

/// Get global config (read-only)
pub fn config() -> RwLockReadGuard<'static, Config> {
    CONFIG.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Reload config from disk
pub fn reload() -> Result<(), ConfigError> {
    let new_config = Config::load()?;
    *CONFIG.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = new_config;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub threads: ThreadsConfig,
    pub dirent: DirentConfig,
}

impl Config {
    /// Load config from standard locations
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // 1. Load global config (~/.compat/config.toml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                debug!("Loading global config from {:?}", global_path);
                config = Self::from_file(&global_path)?;
            }
        }

        // 2. Load project config (.compat/config.toml) - overrides global
        let project_path = Path::new(".compat/config.toml");
        if project_path.exists() {
            debug!("Loading project config from {:?}", project_path);
            let project_config = Self::from_file(project_path)?;
            config.merge(project_config);
        }

        // 3. Apply environment variable overrides
        config.apply_env_overrides();

        Ok(config)
    }

    /// Parse a single config file without consulting any other source.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Global config path: ~/.compat/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".compat/config.toml"))
    }

    /// Merge another config (project overrides).
    ///
    /// Only values that differ from the defaults replace what is already loaded.
    pub fn merge(&mut self, other: Config) {
        let defaults = Config::default();
        if other.logging.level != defaults.logging.level {
            self.logging.level = other.logging.level;
        }
        if other.logging.with_target != defaults.logging.with_target {
            self.logging.with_target = other.logging.with_target;
        }
        if other.threads.tss_capacity != defaults.threads.tss_capacity {
            self.threads.tss_capacity = other.threads.tss_capacity;
        }
        if other.threads.tss_dtor_iterations != defaults.threads.tss_dtor_iterations {
            self.threads.tss_dtor_iterations = other.threads.tss_dtor_iterations;
        }
        if other.dirent.name_max != defaults.dirent.name_max {
            self.dirent.name_max = other.dirent.name_max;
        }
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("COMPAT_LOG") {
            self.logging.level = level;
        }
        if let Ok(iterations) = std::env::var("COMPAT_TSS_DTOR_ITERATIONS") {
            if let Ok(n) = iterations.parse() {
                self.threads.tss_dtor_iterations = n;
            }
        }
    }

    /// Generate default config TOML string
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset: error, warn, info, debug, trace
    pub level: String,
    /// Print the tracing target next to each event
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            with_target: false,
        }
    }
}

impl LoggingConfig {
    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse(&self.level).unwrap_or(LogLevel::Warn)
    }
}

/// Threading emulator tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadsConfig {
    /// Destructor slots available to `tss_create` (never above 1024)
    pub tss_capacity: usize,
    /// Passes over the destructor registry at thread exit
    pub tss_dtor_iterations: usize,
}

impl Default for ThreadsConfig {
    fn default() -> Self {
        Self {
            tss_capacity: TSS_REGISTRY_MAX,
            tss_dtor_iterations: 4,
        }
    }
}

impl ThreadsConfig {
    /// Registry capacity clamped to the fixed backing size.
    pub fn effective_tss_capacity(&self) -> usize {
        self.tss_capacity.min(TSS_REGISTRY_MAX)
    }
}

/// Directory stream tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirentConfig {
    /// Name length reported to callers (entries always hold PATH_MAX + 1 units)
    pub name_max: usize,
}

impl Default for DirentConfig {
    fn default() -> Self {
        Self { name_max: 260 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.threads.tss_capacity, 1024);
        assert_eq!(config.threads.tss_dtor_iterations, 4);
        assert_eq!(config.dirent.name_max, 260);
        assert_eq!(config.logging.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[logging]"));
        assert!(toml_str.contains("[threads]"));
        assert!(toml_str.contains("tss_dtor_iterations = 4"));
    }

    #[test]
    fn test_capacity_is_clamped() {
        let threads = ThreadsConfig {
            tss_capacity: 4096,
            ..Default::default()
        };
        assert_eq!(threads.effective_tss_capacity(), TSS_REGISTRY_MAX);
    }

    #[test]
    fn test_merge_keeps_defaults_from_other() {
        let mut base = Config::default();
        base.logging.level = "debug".to_string();

        let mut project = Config::default();
        project.threads.tss_dtor_iterations = 8;

        base.merge(project);
        assert_eq!(base.logging.level, "debug");
        assert_eq!(base.threads.tss_dtor_iterations, 8);
    }
}
