use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the config directory")]
    NoConfigDir,
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// User settings. Durations are stored in the units a user would type them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seconds a tab must stay active before it moves to the front.
    pub reorder_delay: f64,
    pub auto_close_enabled: bool,
    /// Idle minutes before a tab is closed.
    pub auto_close_time: f64,
    /// Seconds without a repeat before a cycle commits.
    pub cycle_timeout: f64,
    /// Leave pinned tabs alone when closing tabs in bulk.
    pub skip_pinned: bool,
    /// Minutes of remaining idle time at which the countdown turns to a warning.
    pub warning_time: f64,
    /// Seconds an activation must settle before it counts.
    pub active_delay: f64,
    /// Hostnames and `file:` URLs auto-close never touches.
    pub auto_close_whitelist: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            reorder_delay: 5.0,
            auto_close_enabled: false,
            auto_close_time: 60.0,
            cycle_timeout: 3.0,
            skip_pinned: true,
            warning_time: 5.0,
            active_delay: 0.0,
            auto_close_whitelist: Vec::new(),
        }
    }
}

fn secs(value: f64) -> Duration { Duration::try_from_secs_f64(value.max(0.0)).unwrap_or_default() }

impl Settings {
    pub fn reorder_delay(&self) -> Duration { secs(self.reorder_delay) }

    pub fn auto_close_time(&self) -> Duration { secs(self.auto_close_time * 60.0) }

    pub fn cycle_timeout(&self) -> Duration { secs(self.cycle_timeout) }

    pub fn warning_time(&self) -> Duration { secs(self.warning_time * 60.0) }

    pub fn active_delay(&self) -> Duration { secs(self.active_delay) }

    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("tbbr").join("settings.toml"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(path, &contents)
    }

    /// Like [`Settings::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(path, &contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(?path, "no settings file, using defaults");
                Ok(Settings::default())
            }
            Err(source) => Err(ConfigError::Io { path: path.to_owned(), source }),
        }
    }

    fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> { Ok(toml::to_string_pretty(self)?) }

    pub fn apply(&mut self, patch: &SettingsPatch) -> SettingsDelta {
        let was_enabled = self.auto_close_enabled;
        macro_rules! take {
            ($($field:ident),*) => {
                $(if let Some(value) = &patch.$field {
                    self.$field = value.clone();
                })*
            };
        }
        take!(
            reorder_delay,
            auto_close_enabled,
            auto_close_time,
            cycle_timeout,
            skip_pinned,
            warning_time,
            active_delay,
            auto_close_whitelist
        );
        SettingsDelta {
            auto_close_toggled: (was_enabled != self.auto_close_enabled)
                .then_some(self.auto_close_enabled),
        }
    }
}

/// A settings change notification. Only the keys that changed are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    pub reorder_delay: Option<f64>,
    pub auto_close_enabled: Option<bool>,
    pub auto_close_time: Option<f64>,
    pub cycle_timeout: Option<f64>,
    pub skip_pinned: Option<bool>,
    pub warning_time: Option<f64>,
    pub active_delay: Option<f64>,
    pub auto_close_whitelist: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsDelta {
    /// The new auto-close enablement, when it changed.
    pub auto_close_toggled: Option<bool>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn partial_files_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "reorder_delay = 2.5\nauto_close_whitelist = [\"example.com\"]\n")
            .unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.reorder_delay(), Duration::from_millis(2500));
        assert_eq!(settings.auto_close_whitelist, vec!["example.com".to_string()]);
        assert_eq!(settings.auto_close_time(), Duration::from_secs(3600));
        assert!(settings.skip_pinned);
    }

    #[test]
    fn missing_file_is_default_but_bad_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert_eq!(Settings::load_or_default(&missing).unwrap(), Settings::default());

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "reorder_delay = \"soon\"").unwrap();
        let err = Settings::load_or_default(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"), "{err}");
    }

    #[test]
    fn toml_round_trip() {
        let settings = Settings {
            active_delay: 0.25,
            ..Settings::default()
        };
        let text = settings.to_toml().unwrap();
        assert_eq!(toml::from_str::<Settings>(&text).unwrap(), settings);
    }

    #[test]
    fn negative_durations_clamp_to_zero() {
        let settings = Settings { reorder_delay: -3.0, ..Settings::default() };
        assert_eq!(settings.reorder_delay(), Duration::ZERO);
    }

    #[test]
    fn apply_reports_auto_close_toggles_only() {
        let mut settings = Settings::default();
        let delta = settings.apply(&SettingsPatch {
            cycle_timeout: Some(1.0),
            ..SettingsPatch::default()
        });
        assert_eq!(delta.auto_close_toggled, None);
        assert_eq!(settings.cycle_timeout(), Duration::from_secs(1));

        let delta = settings.apply(&SettingsPatch {
            auto_close_enabled: Some(true),
            ..SettingsPatch::default()
        });
        assert_eq!(delta.auto_close_toggled, Some(true));

        let delta = settings.apply(&SettingsPatch {
            auto_close_enabled: Some(true),
            ..SettingsPatch::default()
        });
        assert_eq!(delta.auto_close_toggled, None);
    }
}
