//! Configuration loading and management
//!
//! Handles parsing of `nudge.toml` configuration files.

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Reminder delivery configuration
    #[serde(default)]
    pub reminders: ReminderConfig,

    /// Defaults applied to new tasks
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Store-related configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory for the task snapshot; platform data dir when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Reminder delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// The exact-wake permission gate. When false, alarm-tier triggers are
    /// skipped at schedule time (early warnings still register).
    #[serde(default = "default_exact_wake")]
    pub exact_wake: bool,

    /// Ring the terminal bell while an alarm session is active
    #[serde(default = "default_bell")]
    pub bell: bool,
}

fn default_exact_wake() -> bool {
    true
}

fn default_bell() -> bool {
    true
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            exact_wake: default_exact_wake(),
            bell: default_bell(),
        }
    }
}

/// Defaults for new tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default category: personal, work, study
    #[serde(default = "default_category")]
    pub category: String,

    /// Default priority: low, medium, high
    #[serde(default = "default_priority")]
    pub priority: String,
}

fn default_category() -> String {
    "personal".to_string()
}

fn default_priority() -> String {
    "medium".to_string()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            category: default_category(),
            priority: default_priority(),
        }
    }
}

impl Config {
    /// Load configuration from a specific file
    pub fn load(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the platform config dir, or return defaults
    pub fn load_default() -> Self {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    /// Default config file location (`<config_dir>/nudge.toml`)
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "nudge").map(|dirs| dirs.config_dir().join("nudge.toml"))
    }

    fn validate(&self) -> Result<()> {
        self.defaults
            .category
            .parse::<crate::task::Category>()
            .map_err(|_| {
                Error::InvalidConfig(format!(
                    "unknown default category: {}",
                    self.defaults.category
                ))
            })?;
        self.defaults
            .priority
            .parse::<crate::task::Priority>()
            .map_err(|_| {
                Error::InvalidConfig(format!(
                    "unknown default priority: {}",
                    self.defaults.priority
                ))
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert!(cfg.store.dir.is_none());
        assert!(cfg.reminders.exact_wake);
        assert!(cfg.reminders.bell);
        assert_eq!(cfg.defaults.category, "personal");
        assert_eq!(cfg.defaults.priority, "medium");
    }

    #[test]
    fn load_parses_overrides() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("nudge.toml");
        fs::write(
            &path,
            r#"
[store]
dir = "/tmp/nudge-test"

[reminders]
exact_wake = false
bell = false

[defaults]
category = "work"
priority = "high"
"#,
        )
        .unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.store.dir, Some(PathBuf::from("/tmp/nudge-test")));
        assert!(!cfg.reminders.exact_wake);
        assert!(!cfg.reminders.bell);
        assert_eq!(cfg.defaults.category, "work");
        assert_eq!(cfg.defaults.priority, "high");
    }

    #[test]
    fn load_rejects_unknown_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("nudge.toml");
        fs::write(&path, "[defaults]\ncategory = \"chores\"\n").unwrap();

        assert!(matches!(
            Config::load(&path),
            Err(Error::InvalidConfig(_))
        ));
    }
}
