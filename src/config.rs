use crate::calendar::{CellLimits, DEFAULT_WEEK_START};
use crate::color::DEFAULT_EVENT_HEX;
use anyhow::{Context, Result};
use chrono::Weekday;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub week_start: Weekday,
    pub task_emoji_limit: usize,
    pub event_marker_limit: usize,
    pub default_event_color: String,
}

impl Default for Config {
    fn default() -> Self {
        let limits = CellLimits::default();
        Config {
            data_dir: None,
            week_start: DEFAULT_WEEK_START,
            task_emoji_limit: limits.tasks,
            event_marker_limit: limits.events,
            default_event_color: DEFAULT_EVENT_HEX.to_string(),
        }
    }
}

impl Config {
    /// Loads `explicit` if given, otherwise the platform config file. A
    /// missing file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) => path,
                None => return Ok(Config::default()),
            },
        };
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let data =
            fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        let config: Config = serde_yaml::from_str(&data)
            .with_context(|| format!("parsing config file {:?}", path))?;
        Ok(config)
    }

    pub fn cell_limits(&self) -> CellLimits {
        CellLimits {
            tasks: self.task_emoji_limit,
            events: self.event_marker_limit,
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "moodplanner").map(|dirs| dirs.config_dir().join("config.yml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load(Some(&dir.path().join("absent.yml"))).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.week_start, Weekday::Mon);
        assert_eq!(config.cell_limits(), CellLimits { tasks: 5, events: 3 });
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yml");
        fs::write(&path, "week_start: Sun\ntask_emoji_limit: 2\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.week_start, Weekday::Sun);
        assert_eq!(config.task_emoji_limit, 2);
        assert_eq!(config.event_marker_limit, 3);
        assert_eq!(config.default_event_color, DEFAULT_EVENT_HEX);
    }

    #[test]
    fn data_dir_is_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yml");
        fs::write(&path, "data_dir: /srv/planner\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/srv/planner")));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yml");
        fs::write(&path, "task_emoji_limit: [oops\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
