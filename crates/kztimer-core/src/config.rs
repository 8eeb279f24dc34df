//! TOML-based timer configuration.
//!
//! Holds the guard windows and cooldowns of the timer state machine:
//! - grace windows after teleporting, leaving noclip and landing
//! - the start sound cooldown and the pause/resume cooldown
//! - bounds on mode and course names
//! - the chat prefix used for broadcasts
//!
//! Configuration is stored at `~/.config/kztimer/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, CoreError, Result};

/// Timer configuration.
///
/// All durations are in seconds of server time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Minimum time between two start sounds.
    #[serde(default = "default_sound_cooldown")]
    pub sound_cooldown: f64,
    /// Grace window after a teleport or a landing during which no run may start.
    #[serde(default = "default_min_ground_time")]
    pub min_ground_time: f64,
    /// Grace window after leaving noclip during which no run may start.
    #[serde(default = "default_min_ground_time")]
    pub noclip_grace_time: f64,
    /// Cooldown between pausing and resuming within one run.
    #[serde(default = "default_pause_cooldown")]
    pub pause_cooldown: f64,
    #[serde(default = "default_max_name_length")]
    pub max_mode_name_length: usize,
    #[serde(default = "default_max_name_length")]
    pub max_course_name_length: usize,
    #[serde(default = "default_chat_prefix")]
    pub chat_prefix: String,
}

fn default_sound_cooldown() -> f64 {
    0.15
}
fn default_min_ground_time() -> f64 {
    0.05
}
fn default_pause_cooldown() -> f64 {
    1.0
}
fn default_max_name_length() -> usize {
    64
}
fn default_chat_prefix() -> String {
    "{lime}KZ {grey}|".into()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            sound_cooldown: default_sound_cooldown(),
            min_ground_time: default_min_ground_time(),
            noclip_grace_time: default_min_ground_time(),
            pause_cooldown: default_pause_cooldown(),
            max_mode_name_length: default_max_name_length(),
            max_course_name_length: default_max_name_length(),
            chat_prefix: default_chat_prefix(),
        }
    }
}

/// Returns `~/.config/kztimer[-dev]/` based on KZTIMER_ENV.
///
/// Set KZTIMER_ENV=dev to use the development directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn config_dir() -> Result<PathBuf> {
    let base_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;

    let env = std::env::var("KZTIMER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("kztimer-dev")
    } else {
        base_dir.join("kztimer")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

impl TimerConfig {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| {
                                    invalid(format!("cannot parse '{value}' as number"))
                                })?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf> {
        Ok(config_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load and validate a config file at an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg: TimerConfig = toml::from_str(&content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Reject negative windows and zero-length name bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let windows = [
            ("sound_cooldown", self.sound_cooldown),
            ("min_ground_time", self.min_ground_time),
            ("noclip_grace_time", self.noclip_grace_time),
            ("pause_cooldown", self.pause_cooldown),
        ];
        for (key, value) in windows {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: format!("must be a non-negative number of seconds, got {value}"),
                });
            }
        }
        for (key, value) in [
            ("max_mode_name_length", self.max_mode_name_length),
            ("max_course_name_length", self.max_course_name_length),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: "must be greater than zero".into(),
                });
            }
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. The caller decides whether to persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// or fails validation. On error `self` is left unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: TimerConfig = serde_json::from_value(json).map_err(|e| {
            CoreError::from(ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = TimerConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: TimerConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let parsed: TimerConfig = toml::from_str("pause_cooldown = 2.5").unwrap();
        assert_eq!(parsed.pause_cooldown, 2.5);
        assert_eq!(parsed.sound_cooldown, 0.15);
        assert_eq!(parsed.max_course_name_length, 64);
    }

    #[test]
    fn get_and_set_by_key() {
        let mut cfg = TimerConfig::default();
        assert_eq!(cfg.get("pause_cooldown").as_deref(), Some("1.0"));

        cfg.set("pause_cooldown", "0.5").unwrap();
        assert_eq!(cfg.pause_cooldown, 0.5);

        cfg.set("max_mode_name_length", "32").unwrap();
        assert_eq!(cfg.max_mode_name_length, 32);

        cfg.set("chat_prefix", "[KZ]").unwrap();
        assert_eq!(cfg.get("chat_prefix").as_deref(), Some("[KZ]"));
    }

    #[test]
    fn set_rejects_unknown_and_invalid_values() {
        let mut cfg = TimerConfig::default();
        assert!(cfg.set("nope", "1").is_err());
        assert!(cfg.set("pause_cooldown", "soon").is_err());
        assert!(cfg.set("pause_cooldown", "-1").is_err());
        assert!(cfg.set("max_course_name_length", "0").is_err());
        assert_eq!(cfg, TimerConfig::default());
    }

    #[test]
    fn save_and_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = TimerConfig::default();
        cfg.min_ground_time = 0.1;
        cfg.save_to(&path).unwrap();

        let loaded = TimerConfig::load_from(&path).unwrap();
        assert_eq!(loaded.min_ground_time, 0.1);
    }

    #[test]
    fn load_from_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "sound_cooldown = -0.5\n").unwrap();
        assert!(TimerConfig::load_from(&path).is_err());
    }

    #[test]
    fn load_errors_surface_and_leave_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            TimerConfig::load_from(&missing),
            Err(CoreError::Config(ConfigError::LoadFailed { .. }))
        ));
        assert!(!missing.exists());

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "pause_cooldown = \"soon\"\n").unwrap();
        assert!(TimerConfig::load_from(&broken).is_err());
        assert_eq!(
            std::fs::read_to_string(&broken).unwrap(),
            "pause_cooldown = \"soon\"\n"
        );
    }
}
