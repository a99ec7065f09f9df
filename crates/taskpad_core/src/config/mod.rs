use crate::error::AppError;
use crate::model::Priority;
use crate::notify::DisplayPolicy;
use crate::reminder::ReminderConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TASKPAD_CONFIG_PATH";

/// Terminal colors for priority labels. Empty codes mean plain text.
#[derive(Debug, Clone)]
pub struct Palette {
    pub high: &'static str,
    pub medium: &'static str,
    pub low: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn colorize(&self, priority: Priority, text: &str) -> String {
        let code = match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        };

        if code.is_empty() {
            text.to_string()
        } else {
            format!("{code}{text}{}", self.reset)
        }
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match theme {
        // red / gold / green, matching the priority dot colors of the UI
        Some("vivid") => Palette {
            high: "\x1b[38;5;196m",
            medium: "\x1b[38;5;178m",
            low: "\x1b[38;5;71m",
            reset: "\x1b[0m",
        },
        _ => Palette {
            high: "",
            medium: "",
            low: "",
            reset: "",
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    pub interval_secs: u64,
    pub stagger_ms: u64,
    pub dedup: bool,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            stagger_ms: 500,
            dedup: true,
        }
    }
}

impl ReminderSettings {
    pub fn to_config(&self) -> ReminderConfig {
        ReminderConfig {
            interval: Duration::from_secs(self.interval_secs),
            stagger: Duration::from_millis(self.stagger_ms),
            dedup: self.dedup,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: Option<String>,
    pub push_endpoint: Option<String>,
    pub reminders: ReminderSettings,
    pub display: DisplayPolicy,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("taskpad").join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("taskpad")
            .join(CONFIG_FILE_NAME))
    }
}

/// Defaults plus the load error when the file is missing or malformed; a
/// broken config never blocks startup.
pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })
}
