use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Weekday};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::stats::StatisticsOptions;

fn default_first_weekday() -> String {
    "monday".to_string()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Day the week starts on, e.g. "monday" or "sun".
    #[serde(default = "default_first_weekday")]
    pub first_weekday: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            first_weekday: default_first_weekday(),
        }
    }
}

impl CalendarConfig {
    pub fn first_weekday(&self) -> Result<Weekday> {
        self.first_weekday.trim().parse::<Weekday>().map_err(|_| {
            anyhow!(
                "Unknown weekday '{}' in [calendar] first_weekday",
                self.first_weekday
            )
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub group_by_category: bool,
    /// List archived habits alongside active ones.
    #[serde(default)]
    pub show_archived: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            group_by_category: true,
            show_archived: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl AppConfig {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("", "", "trabits")
            .context("Could not determine project directories")
    }

    pub fn config_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn db_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("trabits.db"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Reading {:?}", path))?;
        let config: AppConfig = toml::from_str(&content).context("Parsing config.toml")?;
        // Fail early on a bad weekday rather than on the first report
        config.calendar.first_weekday()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).context("Serializing config")?;
        std::fs::write(path, content).with_context(|| format!("Writing {:?}", path))?;
        Ok(())
    }

    /// Applies the settings that were given and reports whether anything
    /// changed. A bad weekday leaves the config untouched.
    pub fn update(
        &mut self,
        first_weekday: Option<&str>,
        group_by_category: Option<bool>,
        show_archived: Option<bool>,
    ) -> Result<bool> {
        let before = (
            self.calendar.first_weekday.clone(),
            self.display.group_by_category,
            self.display.show_archived,
        );
        if let Some(day) = first_weekday {
            let calendar = CalendarConfig {
                first_weekday: day.trim().to_lowercase(),
            };
            calendar.first_weekday()?;
            self.calendar = calendar;
        }
        if let Some(group) = group_by_category {
            self.display.group_by_category = group;
        }
        if let Some(show) = show_archived {
            self.display.show_archived = show;
        }
        Ok(before
            != (
                self.calendar.first_weekday.clone(),
                self.display.group_by_category,
                self.display.show_archived,
            ))
    }

    pub fn ensure_data_dir() -> Result<PathBuf> {
        let dir = Self::data_dir()?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn statistics_options(&self, today: NaiveDate) -> Result<StatisticsOptions> {
        Ok(StatisticsOptions {
            first_weekday: self.calendar.first_weekday()?,
            group_by_category: self.display.group_by_category,
            today,
        })
    }
}
