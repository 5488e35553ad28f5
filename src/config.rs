//! Application settings, read from an optional TOML file and `CHOUSEI_*`
//! environment variables (`CHOUSEI_STORAGE__DATA_DIR=/srv/chousei`).

use crate::aggregate::AttendancePolicy;
use crate::error::SettingsError;
use crate::slot::{slot_grid, TimeSlot};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "CHOUSEI";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    pub attendance: AttendancePolicy,
    pub slots: SlotConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// The time slot grid offered by new events.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SlotConfig {
    pub start: TimeSlot,
    pub end: TimeSlot,
    pub step_minutes: u32,
}

impl Default for SlotConfig {
    fn default() -> Self {
        SlotConfig {
            start: TimeSlot::new(9, 0).expect("valid time"),
            end: TimeSlot::new(18, 0).expect("valid time"),
            step_minutes: 30,
        }
    }
}

impl SlotConfig {
    pub fn grid(&self) -> Vec<TimeSlot> {
        slot_grid(self.start, self.end, self.step_minutes)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `events.json` and `allUsers.json`.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> Result<log::LevelFilter, SettingsError> {
        self.level.parse().map_err(|_| SettingsError::Invalid {
            field: "logging.level",
            reason: format!("unknown level `{}`", self.level),
        })
    }
}

impl Settings {
    /// Loads settings from `path` (when given) and the environment, on top
    /// of the defaults, and validates them.
    pub fn load(path: Option<&Path>) -> Result<Settings, SettingsError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings: Settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let quorum = self.attendance.student_quorum;
        if !(quorum > 0.0 && quorum <= 1.0) {
            return Err(SettingsError::Invalid {
                field: "attendance.student_quorum",
                reason: format!("{} is not within (0, 1]", quorum),
            });
        }

        if self.slots.step_minutes == 0 {
            return Err(SettingsError::Invalid {
                field: "slots.step_minutes",
                reason: "must be positive".to_string(),
            });
        }

        if self.slots.start > self.slots.end {
            return Err(SettingsError::Invalid {
                field: "slots.start",
                reason: format!("{} is after slots.end {}", self.slots.start, self.slots.end),
            });
        }

        self.logging.level_filter()?;
        Ok(())
    }

    /// Writes these settings as TOML.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let content = toml::to_string_pretty(self).map_err(|e| SettingsError::Write(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Write(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| SettingsError::Write(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::canonical_slots;
    use std::io::Write;

    #[test]
    fn defaults_match_fixed_behaviour() {
        let settings = Settings::default();

        assert!(settings.validate().is_ok());
        assert_eq!(settings.attendance.student_quorum, 0.8);
        assert_eq!(settings.slots.grid(), canonical_slots());
        assert_eq!(settings.logging.level_filter().unwrap(), log::LevelFilter::Info);
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[attendance]
student_quorum = 0.75

[slots]
start = "10:00"
end = "12:00"

[storage]
data_dir = "/tmp/chousei"
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(settings.attendance.student_quorum, 0.75);
        assert_eq!(settings.slots.grid().len(), 5);
        assert_eq!(settings.slots.step_minutes, 30);
        assert_eq!(settings.storage.data_dir, PathBuf::from("/tmp/chousei"));
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn rejects_nonsense() {
        let mut settings = Settings::default();
        settings.attendance.student_quorum = 1.5;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.slots.step_minutes = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.slots.start = TimeSlot::new(19, 0).unwrap();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.logging.level = "loud".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chousei.toml");

        let mut settings = Settings::default();
        settings.slots.step_minutes = 60;
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(Some(&path)).unwrap(), settings);
    }
}
